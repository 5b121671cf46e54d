//! Multi-day schedule windows and normalization into [`Programme`] records

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::errors::{ScheduleError, ScheduleResult};
use crate::models::{Programme, RawScheduleEntry};
use crate::schedule::fetcher::ScheduleFetcher;
use crate::utils::time::{format_day_key, parse_schedule_time, station_day, to_iso_millis};

/// Walks the station-local days of a window, one fetch per day
pub struct ScheduleAggregator<F> {
    fetcher: F,
    timezone: Tz,
}

impl<F: ScheduleFetcher> ScheduleAggregator<F> {
    pub fn new(fetcher: F, timezone: Tz) -> Self {
        Self { fetcher, timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Fetch every station-local day from `start` through `end` and normalize the result.
    ///
    /// Days are fetched sequentially in ascending order and concatenated without
    /// de-duplication. Entries with unreadable times or a non-positive duration are
    /// skipped. An empty result is an error.
    pub async fn fetch_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ScheduleResult<Vec<Programme>> {
        let first_day = station_day(start, self.timezone);
        let last_day = station_day(end, self.timezone);

        debug!("Getting schedule data for {}", format_day_key(first_day));
        let mut entries = self.fetcher.fetch_day(first_day).await?.data;

        let mut cursor = first_day;
        while cursor < last_day {
            cursor = match cursor.succ_opt() {
                Some(next) => next,
                None => break,
            };
            debug!("Getting schedule data for {}", format_day_key(cursor));
            entries.extend(self.fetcher.fetch_day(cursor).await?.data);
        }

        if entries.is_empty() {
            return Err(ScheduleError::EmptySchedule {
                start: to_iso_millis(start),
                end: to_iso_millis(end),
            });
        }

        let mut programmes = Vec::with_capacity(entries.len());
        for entry in &entries {
            let programme = match normalize_entry(entry, self.timezone) {
                Ok(programme) => programme,
                Err(e) => {
                    warn!("Skipping unusable schedule entry: {}", e);
                    continue;
                }
            };
            if programme.start_date >= programme.end_date {
                warn!(
                    "Skipping '{}' ({}): start {} is not before end {}",
                    programme.title,
                    programme.series_id,
                    to_iso_millis(programme.start_date),
                    to_iso_millis(programme.end_date)
                );
                continue;
            }
            programmes.push(programme);
        }

        if programmes.is_empty() {
            return Err(ScheduleError::EmptySchedule {
                start: to_iso_millis(start),
                end: to_iso_millis(end),
            });
        }

        Ok(programmes)
    }
}

/// Map a raw provider entry to a [`Programme`]
pub fn normalize_entry(entry: &RawScheduleEntry, timezone: Tz) -> ScheduleResult<Programme> {
    let context = || format!("entry '{}' ({})", entry.title, entry.series_id);

    let start_date = parse_schedule_time(&entry.start_time, timezone)
        .map_err(|e| ScheduleError::parse(format!("startTime of {}", context()), e))?;
    let end_date = parse_schedule_time(&entry.end_time_real, timezone)
        .map_err(|e| ScheduleError::parse(format!("endTimeReal of {}", context()), e))?;

    let thumbnail = entry
        .episode_thumbnail_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .unwrap_or(&entry.thumbnail)
        .to_string();

    Ok(Programme {
        series_id: entry.series_id.clone(),
        airing_id: entry.airing_id.clone(),
        title: entry.title.clone(),
        subtitle: entry.episode_title.clone(),
        description: entry.description.clone(),
        thumbnail,
        start_date,
        end_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawSchedule;
    use crate::schedule::fetcher::MockScheduleFetcher;
    use chrono::{NaiveDate, TimeZone};
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn tokyo() -> Tz {
        chrono_tz::Asia::Tokyo
    }

    fn entry(title: &str, start: &str, end: &str) -> RawScheduleEntry {
        RawScheduleEntry {
            series_id: "S1".to_string(),
            airing_id: "000".to_string(),
            title: title.to_string(),
            start_time: start.to_string(),
            end_time_real: end.to_string(),
            thumbnail: "t.jpg".to_string(),
            ..Default::default()
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_normalize_scenario_entry() {
        let raw = RawScheduleEntry {
            episode_title: Some(String::new()),
            episode_thumbnail_url: Some(String::new()),
            ..entry("News", "2024-01-01T00:00:00Z", "2024-01-01T00:30:00Z")
        };

        let programme = normalize_entry(&raw, tokyo()).unwrap();
        assert_eq!(programme.thumbnail, "t.jpg");
        assert_eq!(programme.subtitle.as_deref(), Some(""));
        assert_eq!(
            programme.start_date,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            programme.end_date,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_normalize_prefers_episode_thumbnail() {
        let raw = RawScheduleEntry {
            episode_title: Some("Part 2".to_string()),
            episode_thumbnail_url: Some("episode.jpg".to_string()),
            ..entry("Doc", "2024-01-01T00:00:00Z", "2024-01-01T00:30:00Z")
        };

        let programme = normalize_entry(&raw, tokyo()).unwrap();
        assert_eq!(programme.thumbnail, "episode.jpg");
        assert_eq!(programme.episode_title(), Some("Part 2"));
    }

    #[test]
    fn test_normalize_bad_time_is_parse_error() {
        let raw = entry("Broken", "not a time", "2024-01-01T00:30:00Z");
        assert!(matches!(
            normalize_entry(&raw, tokyo()),
            Err(ScheduleError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn test_single_day_window_fetches_once() {
        let mut fetcher = MockScheduleFetcher::new();
        fetcher
            .expect_fetch_day()
            .with(eq(day(2024, 1, 1)))
            .times(1)
            .returning(|_| {
                Ok(RawSchedule {
                    data: vec![entry("A", "2024-01-01T00:00:00Z", "2024-01-01T01:00:00Z")],
                })
            });

        let aggregator = ScheduleAggregator::new(fetcher, tokyo());
        // 00:00-10:00 UTC is 09:00-19:00 on 2024-01-01 in Tokyo
        let programmes = aggregator
            .fetch_window(
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(programmes.len(), 1);
    }

    #[tokio::test]
    async fn test_window_crossing_boundaries_fetches_each_day_in_order() {
        let mut fetcher = MockScheduleFetcher::new();
        let mut seq = Sequence::new();
        for (d, title) in [(1, "first"), (2, "second"), (3, "third")] {
            fetcher
                .expect_fetch_day()
                .with(eq(day(2024, 1, d)))
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_| {
                    Ok(RawSchedule {
                        data: vec![entry(
                            title,
                            &format!("2024-01-0{d}T00:00:00Z"),
                            &format!("2024-01-0{d}T01:00:00Z"),
                        )],
                    })
                });
        }

        let aggregator = ScheduleAggregator::new(fetcher, tokyo());
        // Tokyo 2024-01-01 09:00 through 2024-01-03 12:00: two day boundaries, three fetches
        let programmes = aggregator
            .fetch_window(
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 1, 3, 3, 0, 0).unwrap(),
            )
            .await
            .unwrap();

        let titles: Vec<_> = programmes.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_duplicates_across_days_are_kept() {
        let mut fetcher = MockScheduleFetcher::new();
        fetcher.expect_fetch_day().times(2).returning(|_| {
            Ok(RawSchedule {
                data: vec![entry("Late", "2024-01-01T14:30:00Z", "2024-01-01T15:30:00Z")],
            })
        });

        let aggregator = ScheduleAggregator::new(fetcher, tokyo());
        let programmes = aggregator
            .fetch_window(
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 1, 1, 16, 0, 0).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(programmes.len(), 2);
        assert_eq!(programmes[0], programmes[1]);
    }

    #[tokio::test]
    async fn test_empty_window_is_error() {
        let mut fetcher = MockScheduleFetcher::new();
        fetcher
            .expect_fetch_day()
            .times(1)
            .returning(|_| Ok(RawSchedule::default()));

        let aggregator = ScheduleAggregator::new(fetcher, tokyo());
        let result = aggregator
            .fetch_window(
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap(),
            )
            .await;
        assert!(matches!(result, Err(ScheduleError::EmptySchedule { .. })));
    }

    #[tokio::test]
    async fn test_fetch_error_stops_aggregation() {
        let mut fetcher = MockScheduleFetcher::new();
        let mut seq = Sequence::new();
        fetcher
            .expect_fetch_day()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(RawSchedule {
                    data: vec![entry("A", "2024-01-01T00:00:00Z", "2024-01-01T01:00:00Z")],
                })
            });
        fetcher
            .expect_fetch_day()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Err(ScheduleError::Fetch {
                    url: "http://example.test".to_string(),
                    status: 503,
                    status_text: "Service Unavailable".to_string(),
                })
            });

        let aggregator = ScheduleAggregator::new(fetcher, tokyo());
        let result = aggregator
            .fetch_window(
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap(),
            )
            .await;
        assert!(matches!(
            result,
            Err(ScheduleError::Fetch { status: 503, .. })
        ));
    }

    fn window_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn window_end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap()
    }

    fn single_day(data: Vec<RawScheduleEntry>) -> MockScheduleFetcher {
        let mut fetcher = MockScheduleFetcher::new();
        fetcher
            .expect_fetch_day()
            .times(1)
            .returning(move |_| Ok(RawSchedule { data: data.clone() }));
        fetcher
    }

    #[tokio::test]
    async fn test_unparseable_entry_is_skipped() {
        let fetcher = single_day(vec![
            entry("Good", "2024-01-01T00:00:00Z", "2024-01-01T00:30:00Z"),
            entry("Bad", "2024-01-01T00:30:00Z", ""),
            entry("Worse", "soon", "2024-01-01T01:30:00Z"),
        ]);

        let aggregator = ScheduleAggregator::new(fetcher, tokyo());
        let programmes = aggregator
            .fetch_window(window_start(), window_end())
            .await
            .unwrap();

        let titles: Vec<_> = programmes.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Good"]);
    }

    #[tokio::test]
    async fn test_non_positive_duration_is_skipped() {
        let fetcher = single_day(vec![
            entry("Zero", "2024-01-01T00:00:00Z", "2024-01-01T00:00:00Z"),
            entry("Valid", "2024-01-01T00:00:00Z", "2024-01-01T00:30:00Z"),
            entry("Backwards", "2024-01-01T01:00:00Z", "2024-01-01T00:30:00Z"),
        ]);

        let aggregator = ScheduleAggregator::new(fetcher, tokyo());
        let programmes = aggregator
            .fetch_window(window_start(), window_end())
            .await
            .unwrap();

        assert_eq!(programmes.len(), 1);
        assert_eq!(programmes[0].title, "Valid");
        assert!(programmes[0].start_date < programmes[0].end_date);
    }

    #[tokio::test]
    async fn test_all_entries_skipped_is_empty_schedule() {
        let fetcher = single_day(vec![
            entry("Zero", "2024-01-01T00:00:00Z", "2024-01-01T00:00:00Z"),
            entry("Broken", "2024-01-01T00:30:00Z", ""),
        ]);

        let aggregator = ScheduleAggregator::new(fetcher, tokyo());
        let result = aggregator.fetch_window(window_start(), window_end()).await;
        assert!(matches!(result, Err(ScheduleError::EmptySchedule { .. })));
    }
}
