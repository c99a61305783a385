use std::num::NonZeroU32;
use std::time::Duration;

use governor::Quota;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("rate must be finite, above zero and at least one token per u64::MAX seconds, got {0}")]
    InvalidRate(f64),
    #[error("burst must be at least 1")]
    ZeroBurst,
    #[error("worker count must be at least 1")]
    ZeroWorkers,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    #[serde(with = "secs")]
    pub connect_timeout: Duration,
    #[serde(with = "secs")]
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Pool configuration for one scrape invocation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScrapeSettings {
    /// Sustained tokens granted per second.
    pub rate: f64,
    /// Bucket capacity: tokens accumulated while idle.
    pub burst: u32,
    /// Fixed number of concurrent workers.
    pub workers: usize,
    pub fetch: FetchSettings,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            rate: 1.0,
            burst: 2,
            workers: 4,
            fetch: FetchSettings::default(),
        }
    }
}

impl ScrapeSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.quota().map(|_| ())
    }

    /// Token bucket quota: one token every `1 / rate` seconds, `burst` tokens up front.
    pub(crate) fn quota(&self) -> Result<Quota, SettingsError> {
        if self.workers == 0 {
            return Err(SettingsError::ZeroWorkers);
        }
        let burst = NonZeroU32::new(self.burst).ok_or(SettingsError::ZeroBurst)?;
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(SettingsError::InvalidRate(self.rate));
        }
        // Rates above one token per nanosecond saturate at that period.
        let period = Duration::try_from_secs_f64(self.rate.recip())
            .map_err(|_| SettingsError::InvalidRate(self.rate))?
            .max(Duration::from_nanos(1));
        let quota = Quota::with_period(period).ok_or(SettingsError::InvalidRate(self.rate))?;
        Ok(quota.allow_burst(burst))
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
