//! Process plumbing around the scrape engine: flags, config, URL sources,
//! the local mock server and result printing.
mod app;
mod cli;
mod config;
mod mock;
mod report;
mod urls;

pub use app::run_app;
