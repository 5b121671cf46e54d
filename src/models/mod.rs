use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Airing id the provider uses when no distinct airing was assigned
pub const NO_AIRING_ID: &str = "000";

/// One normalized scheduled broadcast item. `end_date` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Programme {
    pub series_id: String,
    pub airing_id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: String,
    pub thumbnail: String,
    #[serde(with = "iso_millis")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub end_date: DateTime<Utc>,
}

impl Programme {
    /// True when the provider did not assign a distinct airing id
    pub fn has_placeholder_airing_id(&self) -> bool {
        self.airing_id == NO_AIRING_ID
    }

    /// Episode title, if there is a non-empty one
    pub fn episode_title(&self) -> Option<&str> {
        self.subtitle.as_deref().filter(|s| !s.is_empty())
    }
}

/// Body of one day's schedule response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSchedule {
    #[serde(default)]
    pub data: Vec<RawScheduleEntry>,
}

/// Schedule entry exactly as published by the provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawScheduleEntry {
    pub series_id: String,
    pub airing_id: String,
    pub title: String,
    pub episode_title: Option<String>,
    pub description: String,
    pub link: String,
    pub thumbnail: String,
    pub first_show: Option<i64>,
    pub start_time: String,
    pub end_time: String,
    pub end_time_real: String,
    pub extract_program: Option<i64>,
    pub episode_id: String,
    pub episode_thumbnail_url: Option<String>,
    pub episode_link: String,
}

/// Details of a finished capture supplied by the recording pipeline
#[derive(Debug, Clone, Default)]
pub struct RecordingInfo {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub trimmed: Option<bool>,
    pub cropped: Option<bool>,
}

/// Record persisted next to a finished recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingMetadata {
    #[serde(flatten)]
    pub programme: Programme,
    pub content: String,
    #[serde(
        default,
        with = "iso_millis::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub record_date_start: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "iso_millis::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub record_date_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub trimmed: bool,
    #[serde(default)]
    pub cropped: bool,
    pub sha256: String,
}

impl RecordingMetadata {
    pub fn new(programme: &Programme, recording: &RecordingInfo, sha256: String) -> Self {
        Self {
            programme: programme.clone(),
            content: programme.description.clone(),
            record_date_start: recording.start,
            record_date_end: recording.end,
            trimmed: recording.trimmed.unwrap_or(false),
            cropped: recording.cropped.unwrap_or(false),
            sha256,
        }
    }
}

/// Serde helpers writing instants as `2024-01-01T00:00:00.000Z`
pub mod iso_millis {
    use crate::utils::time::to_iso_millis;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(instant: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&to_iso_millis(*instant))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| serde::de::Error::custom(format!("Invalid instant '{value}': {e}")))
    }

    pub mod option {
        use super::*;

        pub fn serialize<S>(instant: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match instant {
                Some(instant) => serializer.serialize_some(&to_iso_millis(*instant)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let value: Option<String> = Option::deserialize(deserializer)?;
            value
                .map(|value| {
                    DateTime::parse_from_rfc3339(&value)
                        .map(|dt| dt.with_timezone(&Utc))
                        .map_err(|e| {
                            serde::de::Error::custom(format!("Invalid instant '{value}': {e}"))
                        })
                })
                .transpose()
        }
    }
}
