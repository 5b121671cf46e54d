//! Time utilities for station-local day keys and schedule timestamp parsing

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::OnceLock;

/// Parse timezone string and validate it
pub fn parse_station_timezone(tz_str: &str) -> Result<Tz, String> {
    tz_str.trim().parse::<Tz>().map_err(|_| {
        format!("Invalid timezone: '{tz_str}'. Use a named timezone (e.g., 'Asia/Tokyo')")
    })
}

/// Calendar date of `instant` as observed in the station's time zone
pub fn station_day(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Endpoint day key, `YYYYMMDD`
pub fn format_day_key(day: NaiveDate) -> String {
    day.format("%Y%m%d").to_string()
}

/// JavaScript-style ISO-8601 rendering with millisecond precision, e.g. `2024-01-01T00:00:00.000Z`
pub fn to_iso_millis(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Convert a configured duration, saturating instead of failing on overflow
pub fn to_chrono_duration(duration: std::time::Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

fn epoch_millis_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{10,16}$").expect("valid epoch pattern"))
}

/// Parse a provider timestamp.
///
/// Accepts RFC 3339 (`2024-01-01T09:00:00+09:00`), epoch milliseconds
/// (`1704067200000`) and offset-less local times (`2024-01-01T09:00:00`),
/// which are read in the station time zone.
pub fn parse_schedule_time(value: &str, tz: Tz) -> Result<DateTime<Utc>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("Empty timestamp".to_string());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    if epoch_millis_pattern().is_match(value) {
        let millis: i64 = value
            .parse()
            .map_err(|e| format!("Invalid epoch timestamp '{value}': {e}"))?;
        return Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| format!("Epoch timestamp out of range: {value}"));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| format!("Invalid local time in {}: {value}", tz.name()));
        }
    }

    Err(format!("Unable to parse datetime: {value}"))
}
