//! Run configuration: parsing, validation, and loading.
//!
//! A TOML file tunes the engine; every key is optional and unknown keys are
//! rejected. Secrets and locations do not live here: the API key and the database
//! URL come from the environment (`NASA_API_KEY`, `DATABASE_URL`).
//!
//! ```toml
//! base_url = "https://api.nasa.gov/neo/rest/v1"
//! page_size = 20
//! batch_size = 20
//! cooldown_secs = 3600
//! calls_per_window = 1000
//! requests_per_second = 5      # 0 disables client-side pacing
//! max_rate_limit_retries = 3
//! request_timeout_secs = 30
//! time_zone = "Europe/Warsaw"  # omit to use the host's local clock
//! interval_hours = 24
//! ```
//!
//! Entrypoints: [`load_config_str`] and [`load_config_path`].

use std::{path::Path, time::Duration};

use anyhow::Context;
use chrono_tz::Tz;
use neo_source::{
    fetcher::PAGE_SIZE,
    providers::nasa_rest::{NasaProviderOptions, provider::DEFAULT_BASE_URL},
    rate::{DEFAULT_CALLS_PER_WINDOW, DEFAULT_COOLDOWN, RateTracker},
};
use serde::{Deserialize, Serialize};

use crate::sync::{DEFAULT_BATCH_SIZE, SyncOptions};

/// Environment variable naming the SQLite database.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Longest accepted daemon interval: one year.
pub const MAX_INTERVAL_HOURS: u64 = 24 * 366;

/// Validation failures for a [`SyncConfig`].
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A size or interval was configured as zero.
    #[error("{field} must be greater than zero")]
    Zero {
        /// Offending key.
        field: &'static str,
    },

    /// A value exceeds its upper bound.
    #[error("{field} must be at most {max}")]
    TooLarge {
        /// Offending key.
        field: &'static str,
        /// Largest accepted value.
        max: u64,
    },

    /// `time_zone` is not an IANA zone name.
    #[error("unknown time zone {0:?}")]
    UnknownTimeZone(String),

    /// `base_url` is not an absolute http(s) URL.
    #[error("base_url must start with http:// or https://, got {0:?}")]
    BaseUrl(String),
}

/// Tunables for the sync engine and its host loop.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct SyncConfig {
    /// NeoWs endpoint root.
    pub base_url: String,
    /// Objects per `browse` call.
    pub page_size: u32,
    /// Page indices per concurrent batch.
    pub batch_size: u32,
    /// Pause after the call budget is exhausted.
    pub cooldown_secs: u64,
    /// Budget restored after a pause.
    pub calls_per_window: u32,
    /// Client-side pacing; 0 disables it.
    pub requests_per_second: u32,
    /// Cool-down retries for a page refused with 429.
    pub max_rate_limit_retries: u32,
    /// Per-request HTTP timeout.
    pub request_timeout_secs: u64,
    /// IANA zone for `fetched_on`; `None` means the host's local clock.
    pub time_zone: Option<String>,
    /// Interval between runs in daemon mode.
    pub interval_hours: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: PAGE_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            cooldown_secs: DEFAULT_COOLDOWN.as_secs(),
            calls_per_window: DEFAULT_CALLS_PER_WINDOW,
            requests_per_second: 5,
            max_rate_limit_retries: 3,
            request_timeout_secs: 30,
            time_zone: None,
            interval_hours: 24,
        }
    }
}

impl SyncConfig {
    /// Checks ranges and the time zone name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("page_size", u64::from(self.page_size)),
            ("batch_size", u64::from(self.batch_size)),
            ("calls_per_window", u64::from(self.calls_per_window)),
            ("request_timeout_secs", self.request_timeout_secs),
            ("interval_hours", self.interval_hours),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero { field });
            }
        }
        if self.interval_hours > MAX_INTERVAL_HOURS {
            return Err(ConfigError::TooLarge {
                field: "interval_hours",
                max: MAX_INTERVAL_HOURS,
            });
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::BaseUrl(self.base_url.clone()));
        }
        self.time_zone()?;
        Ok(())
    }

    /// Parsed [`Self::time_zone`].
    pub fn time_zone(&self) -> Result<Option<Tz>, ConfigError> {
        self.time_zone
            .as_deref()
            .map(|name| {
                name.trim()
                    .parse::<Tz>()
                    .map_err(|_| ConfigError::UnknownTimeZone(name.to_string()))
            })
            .transpose()
    }

    /// [`Self::cooldown_secs`] as a duration.
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    /// Daemon-mode interval between runs.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours.saturating_mul(60 * 60))
    }

    /// Connection settings for the NeoWs provider.
    pub fn provider_options(&self) -> NasaProviderOptions {
        NasaProviderOptions {
            base_url: self.base_url.clone(),
            requests_per_second: (self.requests_per_second > 0).then_some(self.requests_per_second),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    /// A fresh budget tracker with the configured window and cool-down.
    pub fn rate_tracker(&self) -> RateTracker {
        RateTracker::new(self.calls_per_window, self.cooldown())
    }

    /// Engine options; fails on an unknown time zone.
    pub fn sync_options(&self) -> Result<SyncOptions, ConfigError> {
        Ok(SyncOptions {
            batch_size: self.batch_size,
            max_rate_limit_retries: self.max_rate_limit_retries,
            time_zone: self.time_zone()?,
        })
    }
}

/// Parses and validates a TOML config.
pub fn load_config_str(s: &str) -> anyhow::Result<SyncConfig> {
    let cfg: SyncConfig = toml::from_str(s).context("parse sync config TOML")?;
    cfg.validate()?;
    Ok(cfg)
}

/// Reads, parses and validates a TOML config file.
pub fn load_config_path(path: impl AsRef<Path>) -> anyhow::Result<SyncConfig> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read sync config {}", path.display()))?;
    load_config_str(&s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = load_config_str("").unwrap();
        assert_eq!(cfg, SyncConfig::default());
        assert_eq!(cfg.page_size, 20);
        assert_eq!(cfg.batch_size, 20);
        assert_eq!(cfg.cooldown(), Duration::from_secs(3600));
        assert_eq!(cfg.interval(), Duration::from_secs(86_400));
    }

    #[test]
    fn overrides_and_time_zone_are_applied() {
        let cfg = load_config_str(
            r#"
            batch_size = 5
            cooldown_secs = 10
            requests_per_second = 0
            time_zone = "Europe/Warsaw"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.batch_size, 5);
        assert_eq!(cfg.provider_options().requests_per_second, None);
        assert_eq!(cfg.time_zone().unwrap(), Some(chrono_tz::Europe::Warsaw));
        assert_eq!(cfg.sync_options().unwrap().batch_size, 5);
        assert_eq!(cfg.rate_tracker().cooldown(), Duration::from_secs(10));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(load_config_str("pages = 3").is_err());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let zero = SyncConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert_eq!(
            zero.validate(),
            Err(ConfigError::Zero {
                field: "batch_size"
            })
        );

        let zone = SyncConfig {
            time_zone: Some("Mars/Olympus_Mons".into()),
            ..Default::default()
        };
        assert!(matches!(zone.validate(), Err(ConfigError::UnknownTimeZone(_))));

        let forever = SyncConfig {
            interval_hours: u64::MAX,
            ..Default::default()
        };
        assert_eq!(
            forever.validate(),
            Err(ConfigError::TooLarge {
                field: "interval_hours",
                max: MAX_INTERVAL_HOURS
            })
        );
        assert_eq!(forever.interval(), Duration::from_secs(u64::MAX));
        assert!(load_config_str("interval_hours = 100000").is_err());

        assert!(load_config_str(r#"base_url = "api.nasa.gov""#).is_err());
    }
}
