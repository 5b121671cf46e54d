//! Schedule acquisition: day fetches, window aggregation, caching and resolution

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

pub mod aggregator;
pub mod cache;
pub mod fetcher;
pub mod resolver;

pub use aggregator::ScheduleAggregator;
pub use cache::{CachePolicy, ScheduleCache, ScheduleSnapshot};
pub use fetcher::{HttpScheduleFetcher, ScheduleFetcher};
pub use resolver::{current_programme, upcoming_programmes};

use crate::config::Config;
use crate::errors::{AppResult, ScheduleResult};
use crate::models::Programme;
use crate::utils::clock::Clock;
use crate::utils::time::to_chrono_duration;

/// Answers "what is airing now" from the cached schedule
pub struct ScheduleService<F> {
    cache: ScheduleCache<F>,
    clock: Arc<dyn Clock>,
    safety_buffer: Duration,
}

impl ScheduleService<HttpScheduleFetcher> {
    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let fetcher = HttpScheduleFetcher::from_config(&config.schedule)?;
        let aggregator = ScheduleAggregator::new(fetcher, config.schedule.station_timezone()?);
        let cache = ScheduleCache::new(aggregator, clock.clone(), CachePolicy::from(&config.schedule));
        Ok(Self::new(
            cache,
            clock,
            to_chrono_duration(config.recording.safety_buffer),
        ))
    }
}

impl<F: ScheduleFetcher> ScheduleService<F> {
    pub fn new(cache: ScheduleCache<F>, clock: Arc<dyn Clock>, safety_buffer: Duration) -> Self {
        Self {
            cache,
            clock,
            safety_buffer,
        }
    }

    pub fn cache(&self) -> &ScheduleCache<F> {
        &self.cache
    }

    /// Programme airing at now plus the safety buffer, if any
    pub async fn current_programme(&self) -> ScheduleResult<Option<Programme>> {
        let snapshot = self.cache.get().await?;
        Ok(
            current_programme(snapshot.programmes(), self.clock.now(), self.safety_buffer)
                .cloned(),
        )
    }

    /// Programme airing at `instant` exactly, without the safety buffer.
    ///
    /// Used to identify a recording after the fact, when "now" has already moved
    /// on to the next programme.
    pub async fn programme_at(&self, instant: DateTime<Utc>) -> ScheduleResult<Option<Programme>> {
        let snapshot = self.cache.get().await?;
        Ok(current_programme(snapshot.programmes(), instant, Duration::zero()).cloned())
    }

    /// Programmes that have not yet ended
    pub async fn upcoming(&self) -> ScheduleResult<Vec<Programme>> {
        let snapshot = self.cache.get().await?;
        Ok(upcoming_programmes(snapshot.programmes(), self.clock.now())
            .into_iter()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ScheduleError;
    use crate::models::{RawSchedule, RawScheduleEntry};
    use crate::schedule::fetcher::MockScheduleFetcher;
    use crate::utils::clock::ManualClock;
    use chrono::{TimeZone, Utc};

    fn service(fetcher: MockScheduleFetcher, clock: Arc<ManualClock>, buffer: Duration) -> ScheduleService<MockScheduleFetcher> {
        let cache = ScheduleCache::new(
            ScheduleAggregator::new(fetcher, chrono_tz::Asia::Tokyo),
            clock.clone(),
            CachePolicy {
                ttl: std::time::Duration::from_secs(3600),
                lookbehind: std::time::Duration::ZERO,
                lookahead: std::time::Duration::ZERO,
            },
        );
        ScheduleService::new(cache, clock, buffer)
    }

    fn entry(title: &str, start: &str, end: &str) -> RawScheduleEntry {
        RawScheduleEntry {
            series_id: "S1".to_string(),
            airing_id: "001".to_string(),
            title: title.to_string(),
            start_time: start.to_string(),
            end_time_real: end.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_current_programme_applies_buffer() {
        let mut fetcher = MockScheduleFetcher::new();
        fetcher.expect_fetch_day().times(1).returning(|_| {
            Ok(RawSchedule {
                data: vec![
                    entry("Morning", "2024-01-01T02:00:00Z", "2024-01-01T03:00:00Z"),
                    entry("Noon", "2024-01-01T03:00:00Z", "2024-01-01T04:00:00Z"),
                ],
            })
        });

        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 2, 59, 30).unwrap(),
        ));
        let service = service(fetcher, clock, Duration::seconds(60));

        let current = service.current_programme().await.unwrap();
        assert_eq!(current.map(|p| p.title), Some("Noon".to_string()));

        let upcoming = service.upcoming().await.unwrap();
        assert_eq!(upcoming.len(), 2);
    }

    #[tokio::test]
    async fn test_programme_at_identifies_finished_recording() {
        let mut fetcher = MockScheduleFetcher::new();
        fetcher.expect_fetch_day().times(1).returning(|_| {
            Ok(RawSchedule {
                data: vec![
                    entry("Morning", "2024-01-01T02:00:00Z", "2024-01-01T03:00:00Z"),
                    entry("Noon", "2024-01-01T03:00:00Z", "2024-01-01T04:00:00Z"),
                ],
            })
        });

        // Morning has just ended; the buffered "now" already points at Noon
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 5).unwrap(),
        ));
        let service = service(fetcher, clock, Duration::seconds(60));

        let current = service.current_programme().await.unwrap();
        assert_eq!(current.map(|p| p.title), Some("Noon".to_string()));

        let during_morning = Utc.with_ymd_and_hms(2024, 1, 1, 2, 30, 0).unwrap();
        let recorded = service.programme_at(during_morning).await.unwrap();
        assert_eq!(recorded.map(|p| p.title), Some("Morning".to_string()));

        // Bounds are exclusive, so a changeover instant matches neither programme
        let changeover = Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap();
        assert!(service.programme_at(changeover).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unavailable_schedule_is_hard_failure() {
        let mut fetcher = MockScheduleFetcher::new();
        fetcher
            .expect_fetch_day()
            .times(1)
            .returning(|_| Err(ScheduleError::parse("day", "unexpected token")));

        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap(),
        ));
        let service = service(fetcher, clock, Duration::zero());

        assert!(service.current_programme().await.is_err());
    }
}
