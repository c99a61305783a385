use std::collections::hash_map;
use std::collections::{BTreeMap, HashMap};

use crate::ScrapeError;

/// Outcome for one URL: the extracted title or the reason there is none.
pub type FetchResult = Result<String, ScrapeError>;

/// Final mapping from URL to outcome. Keys are unique; recording a URL twice
/// keeps the later outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    entries: HashMap<String, FetchResult>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the outcome for `url`. Returns the replaced outcome.
    pub fn record(&mut self, url: impl Into<String>, result: FetchResult) -> Option<FetchResult> {
        self.entries.insert(url.into(), result)
    }

    pub fn get(&self, url: &str) -> Option<&FetchResult> {
        self.entries.get(url)
    }

    pub fn title(&self, url: &str) -> Option<&str> {
        self.entries
            .get(url)
            .and_then(|result| result.as_ref().ok())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.entries.values().filter(|result| result.is_ok()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, FetchResult> {
        self.entries.iter()
    }

    /// Entries ordered by URL, for stable presentation.
    pub fn sorted(&self) -> BTreeMap<&str, &FetchResult> {
        self.entries
            .iter()
            .map(|(url, result)| (url.as_str(), result))
            .collect()
    }
}

impl IntoIterator for ResultSet {
    type Item = (String, FetchResult);
    type IntoIter = hash_map::IntoIter<String, FetchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, FetchResult)> for ResultSet {
    fn from_iter<I: IntoIterator<Item = (String, FetchResult)>>(iter: I) -> Self {
        let mut set = ResultSet::new();
        for (url, result) in iter {
            set.record(url, result);
        }
        set
    }
}
