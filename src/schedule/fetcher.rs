//! Day-granular access to the provider schedule

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::ScheduleConfig;
use crate::errors::{AppError, AppResult, ScheduleError, ScheduleResult};
use crate::models::RawSchedule;
use crate::utils::time::format_day_key;

/// Fetches one station-local day of raw schedule entries
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScheduleFetcher: Send + Sync {
    async fn fetch_day(&self, day: NaiveDate) -> ScheduleResult<RawSchedule>;
}

/// Fetcher backed by the provider's JSON endpoint
pub struct HttpScheduleFetcher {
    client: Client,
    base_url: String,
}

impl HttpScheduleFetcher {
    pub fn new(
        base_url: impl Into<String>,
        headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(Self::build_headers(headers)?)
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn from_config(config: &ScheduleConfig) -> AppResult<Self> {
        Self::new(config.url.clone(), &config.headers, config.request_timeout)
    }

    fn build_headers(headers: &HashMap<String, String>) -> AppResult<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                AppError::configuration(format!("Invalid header name '{name}': {e}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                AppError::configuration(format!("Invalid value for header '{name}': {e}"))
            })?;
            map.insert(name, value);
        }
        Ok(map)
    }

    /// `<base>/epg/w/<YYYYMMDD>.json`
    pub fn endpoint_for(&self, day: NaiveDate) -> ScheduleResult<Url> {
        let base = format!("{}/", self.base_url.trim_end_matches('/'));
        let url = Url::parse(&base)?.join(&format!("epg/w/{}.json", format_day_key(day)))?;
        Ok(url)
    }
}

#[async_trait]
impl ScheduleFetcher for HttpScheduleFetcher {
    async fn fetch_day(&self, day: NaiveDate) -> ScheduleResult<RawSchedule> {
        let endpoint = self.endpoint_for(day)?;
        debug!("Calling {} for data", endpoint);

        let response = self.client.get(endpoint.clone()).send().await?;

        if !response.status().is_success() {
            return Err(ScheduleError::fetch(endpoint.as_str(), response.status()));
        }

        let body = response.text().await?;
        let schedule: RawSchedule = serde_json::from_str(&body).map_err(|e| {
            ScheduleError::parse(format!("schedule for {}", format_day_key(day)), e.to_string())
        })?;

        debug!(
            "Fetched {} schedule entries for {}",
            schedule.data.len(),
            format_day_key(day)
        );
        Ok(schedule)
    }
}
