use scrape_core::{FetchResult, ResultSet};
use scrape_logging::{scrape_error, scrape_warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Worker-side handle: sends `(url, result)` pairs to the aggregating task.
#[derive(Debug, Clone)]
pub(crate) struct Recorder {
    tx: mpsc::UnboundedSender<(String, FetchResult)>,
}

impl Recorder {
    pub(crate) fn record(&self, url: String, result: FetchResult) {
        if let Err(err) = self.tx.send((url, result)) {
            let (url, _) = err.0;
            scrape_warn!("Result for {} dropped: aggregator already stopped", url);
        }
    }
}

/// Owns the [`ResultSet`] exclusively until every [`Recorder`] is dropped.
pub(crate) struct Aggregator {
    handle: JoinHandle<ResultSet>,
}

impl Aggregator {
    pub(crate) fn spawn() -> (Recorder, Aggregator) {
        let (tx, mut rx) = mpsc::unbounded_channel::<(String, FetchResult)>();
        let handle = tokio::spawn(async move {
            let mut results = ResultSet::new();
            while let Some((url, result)) = rx.recv().await {
                results.record(url, result);
            }
            results
        });
        (Recorder { tx }, Aggregator { handle })
    }

    /// Wait for the last recorder to go away and hand back the frozen set.
    pub(crate) async fn finish(self) -> ResultSet {
        match self.handle.await {
            Ok(results) => results,
            Err(err) => {
                scrape_error!("Result aggregator failed: {}", err);
                ResultSet::new()
            }
        }
    }
}
