use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;
use scrape_logging::LogDestination;

/// Fetch JSON and HTML resources and print the title found in each.
#[derive(Debug, Parser)]
#[command(name = "title_scraper", version)]
pub(crate) struct Cli {
    /// File with one URL per line. Falls back to the config file, then the
    /// built-in list.
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// RON config file with `settings` and `urls`.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Sustained requests per second.
    #[arg(long)]
    pub rate: Option<f64>,

    /// Requests allowed back to back after an idle period.
    #[arg(long)]
    pub burst: Option<u32>,

    /// Number of concurrent workers.
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Whole-request timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<f64>,

    /// Serve mock JSON and HTML documents locally before scraping.
    #[arg(long)]
    pub serve_mock: bool,

    /// Address for `--serve-mock`.
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub mock_addr: SocketAddr,

    /// Also write logs to ./scrape.log.
    #[arg(long)]
    pub log_file: bool,

    /// More output per occurrence (debug, then trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub(crate) fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub(crate) fn log_destination(&self) -> LogDestination {
        if self.log_file {
            LogDestination::Both
        } else {
            LogDestination::Terminal
        }
    }
}
