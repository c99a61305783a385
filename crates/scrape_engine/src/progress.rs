use std::sync::mpsc;

use scrape_core::Stage;
use scrape_logging::scrape_trace;

/// A worker moved to `stage`. `url` is set while a URL is being processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerEvent {
    pub worker: usize,
    pub stage: Stage,
    pub url: Option<String>,
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: WorkerEvent);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressSink;

impl ProgressSink for NoopProgressSink {
    fn emit(&self, _event: WorkerEvent) {}
}

/// Logs each transition at trace level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn emit(&self, event: WorkerEvent) {
        match event.url {
            Some(url) => scrape_trace!("worker={} stage={:?} url={}", event.worker, event.stage, url),
            None => scrape_trace!("worker={} stage={:?}", event.worker, event.stage),
        }
    }
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<WorkerEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<WorkerEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: WorkerEvent) {
        let _ = self.tx.send(event);
    }
}
