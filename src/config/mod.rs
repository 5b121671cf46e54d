use anyhow::Result;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use crate::errors::{AppError, AppResult};
use crate::utils::time::parse_station_timezone;
use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
}

/// Where and how the provider schedule is fetched and cached
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Base URL; day documents live at `<url>/epg/w/<YYYYMMDD>.json`
    #[serde(default = "default_schedule_url")]
    pub url: String,
    /// Time zone in which the provider defines each schedule day
    #[serde(default = "default_station_timezone")]
    pub timezone: String,
    #[serde(default = "default_request_timeout", with = "duration_serde::duration")]
    pub request_timeout: Duration,
    #[serde(default = "default_cache_ttl", with = "duration_serde::duration")]
    pub cache_ttl: Duration,
    #[serde(default = "default_lookbehind", with = "duration_serde::duration")]
    pub lookbehind: Duration,
    #[serde(default = "default_lookahead", with = "duration_serde::duration")]
    pub lookahead: Duration,
    /// Headers the provider requires on every request
    #[serde(default = "default_headers")]
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_save_dir")]
    pub save_dir: PathBuf,
    /// In-progress files older than this are treated as abandoned
    #[serde(
        default = "default_max_in_progress_age",
        with = "duration_serde::duration"
    )]
    pub max_in_progress_age: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Forward bias added to "now" before resolving the airing programme
    #[serde(default = "default_safety_buffer", with = "duration_serde::duration")]
    pub safety_buffer: Duration,
}

fn default_schedule_url() -> String {
    DEFAULT_SCHEDULE_URL.to_string()
}
fn default_station_timezone() -> String {
    DEFAULT_STATION_TIMEZONE.to_string()
}
fn default_request_timeout() -> Duration {
    Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
}
fn default_cache_ttl() -> Duration {
    Duration::from_secs(DEFAULT_CACHE_TTL_SECS)
}
fn default_lookbehind() -> Duration {
    Duration::from_secs(DEFAULT_LOOKBEHIND_SECS)
}
fn default_lookahead() -> Duration {
    Duration::from_secs(DEFAULT_LOOKAHEAD_SECS)
}
fn default_headers() -> HashMap<String, String> {
    HashMap::from([
        ("Accept".to_string(), "application/json".to_string()),
        (
            "User-Agent".to_string(),
            format!("broadcast-recorder/{}", env!("CARGO_PKG_VERSION")),
        ),
    ])
}
fn default_save_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SAVE_DIR)
}
fn default_max_in_progress_age() -> Duration {
    Duration::from_secs(DEFAULT_MAX_IN_PROGRESS_AGE_SECS)
}
fn default_safety_buffer() -> Duration {
    Duration::from_secs(DEFAULT_SAFETY_BUFFER_SECS)
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            url: default_schedule_url(),
            timezone: default_station_timezone(),
            request_timeout: default_request_timeout(),
            cache_ttl: default_cache_ttl(),
            lookbehind: default_lookbehind(),
            lookahead: default_lookahead(),
            headers: default_headers(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            save_dir: default_save_dir(),
            max_in_progress_age: default_max_in_progress_age(),
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            safety_buffer: default_safety_buffer(),
        }
    }
}

impl ScheduleConfig {
    pub fn station_timezone(&self) -> AppResult<Tz> {
        parse_station_timezone(&self.timezone).map_err(AppError::configuration)
    }
}

impl Config {
    /// Load configuration from `path`, writing the defaults there if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, contents)?;
            info!("Wrote default configuration to {}", path.display());
            default_config
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.schedule.station_timezone()?;
        url::Url::parse(&self.schedule.url).map_err(|e| {
            AppError::configuration(format!("Invalid schedule url '{}': {e}", self.schedule.url))
        })?;
        if self.schedule.cache_ttl.is_zero() {
            return Err(AppError::configuration("schedule.cache_ttl must be non-zero"));
        }

        let window = Duration::from_secs(MAX_WINDOW_SECS);
        check_max("schedule.lookbehind", self.schedule.lookbehind, window)?;
        check_max("schedule.lookahead", self.schedule.lookahead, window)?;

        let limit = Duration::from_secs(MAX_DURATION_SECS);
        check_max("schedule.request_timeout", self.schedule.request_timeout, limit)?;
        check_max("schedule.cache_ttl", self.schedule.cache_ttl, limit)?;
        check_max("storage.max_in_progress_age", self.storage.max_in_progress_age, limit)?;
        check_max("recording.safety_buffer", self.recording.safety_buffer, limit)?;
        Ok(())
    }
}

fn check_max(name: &str, value: Duration, max: Duration) -> AppResult<()> {
    if value > max {
        return Err(AppError::configuration(format!(
            "{name} is {}, the maximum is {}",
            humantime::format_duration(value),
            humantime::format_duration(max)
        )));
    }
    Ok(())
}
