/// Content category of a URL, derived from its suffix alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Json,
    Html,
    Unsupported,
}

impl Kind {
    pub const JSON_SUFFIX: &'static str = ".json";
    pub const HTML_SUFFIX: &'static str = ".html";

    /// Classify by exact, case-sensitive suffix. Query strings and fragments are
    /// not stripped: `page.html?x=1` is unsupported.
    pub fn from_url(url: &str) -> Self {
        if url.ends_with(Self::JSON_SUFFIX) {
            Kind::Json
        } else if url.ends_with(Self::HTML_SUFFIX) {
            Kind::Html
        } else {
            Kind::Unsupported
        }
    }

    pub fn is_supported(self) -> bool {
        !matches!(self, Kind::Unsupported)
    }
}
