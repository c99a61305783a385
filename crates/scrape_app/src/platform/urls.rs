use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Scraped when neither a URL file nor configured URLs are given. Both are
/// served by `--serve-mock` on its default address.
pub(crate) const DEFAULT_URLS: &[&str] = &[
    "http://localhost:8080/entity-book-f3bfa24c-2645-48c0-9117-b338bef9b9ab.json",
    "http://localhost:8080/product-book.html",
];

/// One URL per line; surrounding whitespace is trimmed and blank lines skipped.
pub(crate) fn read_urls(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read URLs from {:?}", path))?;
    Ok(parse_urls(&content))
}

fn parse_urls(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn default_urls() -> Vec<String> {
    DEFAULT_URLS.iter().map(|url| url.to_string()).collect()
}
