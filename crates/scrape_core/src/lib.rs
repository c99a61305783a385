//! Scrape core: pure data model and title extraction, no IO.
mod decode;
mod error;
mod extract;
mod kind;
mod result_set;
mod stage;

pub use decode::{decode_body, DecodedBody};
pub use error::ScrapeError;
pub use extract::{html_title, json_title, Extractor, TitleExtractor, PRODUCT_TITLE_CLASS};
pub use kind::Kind;
pub use result_set::{FetchResult, ResultSet};
pub use stage::Stage;
