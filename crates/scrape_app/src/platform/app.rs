use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use scrape_engine::{CancellationToken, LogProgressSink, ResultSet, ScrapeSettings, Scraper};
use scrape_logging::{scrape_info, scrape_warn};

use super::cli::Cli;
use super::config::AppConfig;
use super::{mock, report, urls};

const HEALTH_INTERVAL: Duration = Duration::from_millis(500);
const HEALTH_ATTEMPTS: u32 = 20;

pub fn run_app() -> Result<()> {
    let cli = Cli::parse();
    scrape_logging::initialize(cli.log_destination(), cli.log_level());

    let config = AppConfig::load(cli.config.as_deref())?.apply_overrides(&cli)?;
    let urls = match &cli.file {
        Some(path) => urls::read_urls(path)?,
        None if !config.urls.is_empty() => config.urls.clone(),
        None => urls::default_urls(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let results = runtime.block_on(run(&cli, config.settings, urls))?;

    for line in report::render(&results) {
        println!("{line}");
    }
    Ok(())
}

async fn run(cli: &Cli, settings: ScrapeSettings, urls: Vec<String>) -> Result<ResultSet> {
    if cli.serve_mock {
        let addr = mock::spawn(cli.mock_addr).await?;
        let health_url = format!("http://{addr}{}", mock::HEALTH_PATH);
        mock::wait_until_healthy(&health_url, HEALTH_INTERVAL, HEALTH_ATTEMPTS).await?;
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            scrape_warn!("Interrupted: remaining urls will be recorded as cancelled");
            on_interrupt.cancel();
        }
    });

    scrape_info!(
        "Scraping {} urls with {} workers at {}/s (burst {})",
        urls.len(),
        settings.workers,
        settings.rate,
        settings.burst
    );
    let scraper = Scraper::new(settings)?
        .with_progress(Arc::new(LogProgressSink))
        .with_cancellation(cancel);
    Ok(scraper.run(urls).await)
}
