use std::sync::Arc;
use std::time::Instant;

use governor::Quota;
use scrape_core::{Extractor, ResultSet, TitleExtractor};
use scrape_logging::{scrape_error, scrape_info};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::aggregate::Aggregator;
use crate::pool::{Shared, Worker};
use crate::{
    EngineError, Fetcher, NoopProgressSink, ProgressSink, ReqwestFetcher, ScrapeSettings,
    TokenBucket,
};

/// Orchestrator: wires the work queue, token bucket, worker pool and result
/// aggregator for each call to [`Scraper::run`]. Every run starts with a full
/// bucket and an empty result set. The cancellation token is shared by all
/// runs: once cancelled, later runs record every fetchable URL as cancelled.
pub struct Scraper {
    workers: usize,
    quota: Quota,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    progress: Arc<dyn ProgressSink>,
    cancel: CancellationToken,
}

impl Scraper {
    /// Scraper over HTTP with the default title extractor.
    pub fn new(settings: ScrapeSettings) -> Result<Self, EngineError> {
        let fetcher = ReqwestFetcher::new(settings.fetch.clone())?;
        Self::with_fetcher(settings, Arc::new(fetcher))
    }

    pub fn with_fetcher(
        settings: ScrapeSettings,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, EngineError> {
        let quota = settings.quota()?;
        Ok(Self {
            workers: settings.workers,
            quota,
            fetcher,
            extractor: Arc::new(TitleExtractor),
            progress: Arc::new(NoopProgressSink),
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Cancelling `cancel` aborts rate-limit waits for this and every later
    /// run; see [`Scraper::run`].
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Scrape every URL and return once all workers have exited.
    ///
    /// Exactly `workers` tasks are started before the first URL is queued, so
    /// at most that many fetches are ever in flight. URLs are queued in input
    /// order; completion order is unspecified. Each input URL ends up in the
    /// result set exactly once, the last recorded outcome winning for
    /// duplicates. After cancellation the queue is still drained and URLs that
    /// needed a token are recorded as [`scrape_core::ScrapeError::Cancelled`].
    pub async fn run<I, S>(&self, urls: I) -> ResultSet
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let started = Instant::now();
        let shared = Arc::new(Shared {
            limiter: TokenBucket::new(self.quota),
            fetcher: self.fetcher.clone(),
            extractor: self.extractor.clone(),
            progress: self.progress.clone(),
            cancel: self.cancel.clone(),
        });

        let (queue_tx, queue_rx) = async_channel::bounded::<String>(self.workers);
        let (recorder, aggregator) = Aggregator::spawn();

        let mut pool = JoinSet::new();
        for id in 0..self.workers {
            let worker = Worker::new(id, queue_rx.clone(), shared.clone(), recorder.clone());
            pool.spawn(worker.run());
        }
        drop(queue_rx);
        drop(recorder);

        let mut queued = 0usize;
        for url in urls {
            if queue_tx.send(url.into()).await.is_err() {
                scrape_error!("Work queue closed after {} urls: no worker left", queued);
                break;
            }
            queued += 1;
        }
        queue_tx.close();
        scrape_info!("Queued {} urls for {} workers", queued, self.workers);

        while let Some(joined) = pool.join_next().await {
            if let Err(err) = joined {
                scrape_error!("Worker task failed: {}", err);
            }
        }

        let results = aggregator.finish().await;
        scrape_info!(
            "Scraped {} urls: {} ok, {} failed in {:?}",
            results.len(),
            results.success_count(),
            results.failure_count(),
            started.elapsed()
        );
        results
    }
}

/// Blocking entry point with default fetch settings.
///
/// Builds its own multi-thread runtime, so it must not be called from inside
/// an async context.
pub fn scrape<I, S>(
    urls: I,
    rate: f64,
    burst: u32,
    workers: usize,
) -> Result<ResultSet, EngineError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    scrape_with(
        ScrapeSettings {
            rate,
            burst,
            workers,
            ..ScrapeSettings::default()
        },
        urls,
    )
}

pub fn scrape_with<I, S>(settings: ScrapeSettings, urls: I) -> Result<ResultSet, EngineError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    settings.validate()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(EngineError::Runtime)?;
    runtime.block_on(async move {
        let scraper = Scraper::new(settings)?;
        Ok::<_, EngineError>(scraper.run(urls).await)
    })
}
