use scrape_core::{FetchResult, ResultSet};

pub(crate) fn format_line(url: &str, result: &FetchResult) -> String {
    match result {
        Ok(title) => format!("OK   {url} -> {title:?}"),
        Err(err) => format!("FAIL {url} -> {err}"),
    }
}

/// One line per URL, sorted by URL.
pub(crate) fn render(results: &ResultSet) -> Vec<String> {
    results
        .sorted()
        .into_iter()
        .map(|(url, result)| format_line(url, result))
        .collect()
}
