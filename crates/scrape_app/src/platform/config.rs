use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use scrape_engine::ScrapeSettings;
use scrape_logging::scrape_info;
use serde::Deserialize;

use super::cli::Cli;

/// Contents of the optional RON config file, e.g.
///
/// ```ron
/// (
///     settings: (rate: 2.0, burst: 4, workers: 8, fetch: (request_timeout: 15.0)),
///     urls: ["http://localhost:8080/product-book.html"],
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub settings: ScrapeSettings,
    pub urls: Vec<String>,
}

impl AppConfig {
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {:?}", path))?;
        let config = ron::from_str(&content)
            .with_context(|| format!("failed to parse config from {:?}", path))?;
        scrape_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Command-line flags win over the file.
    pub(crate) fn apply_overrides(mut self, cli: &Cli) -> Result<Self> {
        if let Some(rate) = cli.rate {
            self.settings.rate = rate;
        }
        if let Some(burst) = cli.burst {
            self.settings.burst = burst;
        }
        if let Some(workers) = cli.workers {
            self.settings.workers = workers;
        }
        if let Some(secs) = cli.timeout_secs {
            self.settings.fetch.request_timeout = Duration::try_from_secs_f64(secs)
                .with_context(|| format!("invalid --timeout-secs {secs}"))?;
        }
        self.settings.validate()?;
        Ok(self)
    }
}
