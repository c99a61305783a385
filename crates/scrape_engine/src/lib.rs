//! Scrape engine: concurrent, rate-limited fetch-and-extract over a fixed worker pool.
mod aggregate;
mod fetch;
mod pool;
mod progress;
mod ratelimit;
mod scraper;
mod settings;

pub use fetch::{FetchMetadata, FetchOutput, Fetcher, ReqwestFetcher};
pub use progress::{
    ChannelProgressSink, LogProgressSink, NoopProgressSink, ProgressSink, WorkerEvent,
};
pub use ratelimit::TokenBucket;
pub use scraper::{scrape, scrape_with, Scraper};
pub use settings::{FetchSettings, ScrapeSettings, SettingsError};
pub use tokio_util::sync::CancellationToken;

pub use scrape_core::{FetchResult, Kind, ResultSet, ScrapeError, Stage};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("failed to build http client: {0}")]
    HttpClient(String),
    #[error("failed to start async runtime: {0}")]
    Runtime(std::io::Error),
}
