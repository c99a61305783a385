use std::sync::Arc;

use async_channel::Receiver;
use scrape_core::{Extractor, FetchResult, Kind, ScrapeError, Stage};
use scrape_logging::{scrape_debug, scrape_warn};
use tokio_util::sync::CancellationToken;

use crate::aggregate::Recorder;
use crate::{Fetcher, ProgressSink, TokenBucket, WorkerEvent};

/// Collaborators shared read-only by every worker of a run.
pub(crate) struct Shared {
    pub(crate) limiter: TokenBucket,
    pub(crate) fetcher: Arc<dyn Fetcher>,
    pub(crate) extractor: Arc<dyn Extractor>,
    pub(crate) progress: Arc<dyn ProgressSink>,
    pub(crate) cancel: CancellationToken,
}

pub(crate) struct Worker {
    id: usize,
    queue: Receiver<String>,
    shared: Arc<Shared>,
    recorder: Recorder,
}

impl Worker {
    pub(crate) fn new(
        id: usize,
        queue: Receiver<String>,
        shared: Arc<Shared>,
        recorder: Recorder,
    ) -> Self {
        Self {
            id,
            queue,
            shared,
            recorder,
        }
    }

    /// Process URLs until the queue is closed and drained. After cancellation
    /// the worker keeps draining; every URL that needs a token is recorded as
    /// cancelled without waiting.
    pub(crate) async fn run(self) -> usize {
        let mut processed = 0;
        loop {
            self.emit(Stage::Dequeuing, None);
            let Ok(url) = self.queue.recv().await else {
                break;
            };

            let result = self.process(&url).await;
            if let Err(err) = &result {
                scrape_warn!("worker={} url={} failed: {}", self.id, url, err);
            }

            self.emit(Stage::Recording, Some(&url));
            self.recorder.record(url, result);
            processed += 1;
            self.emit(Stage::Idle, None);
        }
        self.emit(Stage::Exited, None);
        scrape_debug!("worker={} exiting after {} urls", self.id, processed);
        processed
    }

    async fn process(&self, url: &str) -> FetchResult {
        let kind = Kind::from_url(url);
        if !kind.is_supported() {
            return Err(ScrapeError::UnsupportedKind);
        }

        self.emit(Stage::RateLimitWait, Some(url));
        self.shared.limiter.acquire(&self.shared.cancel).await?;

        self.emit(Stage::Fetching, Some(url));
        let output = self.shared.fetcher.fetch(url).await?;

        self.emit(Stage::Extracting, Some(url));
        self.shared.extractor.extract(
            &output.bytes,
            kind,
            output.metadata.content_type.as_deref(),
        )
    }

    fn emit(&self, stage: Stage, url: Option<&str>) {
        self.shared.progress.emit(WorkerEvent {
            worker: self.id,
            stage,
            url: url.map(str::to_string),
        });
    }
}
