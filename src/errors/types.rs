//! Error type definitions for the broadcast recorder
//!
//! The schedule subsystem and the recording store fail in different ways and
//! recover at different points, so each gets its own enum. `AppError` is the
//! umbrella used by the service layer and the binary.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Schedule acquisition errors
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Recording storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Errors raised while fetching and aggregating the provider schedule
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// Provider answered with a non-success status
    #[error("Failed to fetch schedule from {url} (status {status} {status_text})")]
    Fetch {
        url: String,
        status: u16,
        status_text: String,
    },

    /// Response body was not the expected schedule structure
    #[error("Parse error: {context} - {message}")]
    Parse { context: String, message: String },

    /// Aggregated window contained no entries at all
    #[error("Schedule for {start} to {end} is empty (missing items array)")]
    EmptySchedule { start: String, end: String },

    /// Transport level failure, including request timeouts
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Base URL could not be combined with the day key
    #[error("Invalid schedule URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Errors raised by the recording store
#[derive(Error, Debug)]
pub enum StorageError {
    /// Rename between lifecycle suffixes failed
    #[error("Failed to rename {from:?} to {to:?}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    /// Transition out of a terminal state, or onto the same state
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Reading a file (for hashing or inspection) failed
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing a file (metadata, thumbnail, directories) failed
    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Metadata record could not be serialized
    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl ScheduleError {
    /// Create a parse error
    pub fn parse<C: Into<String>, M: Into<String>>(context: C, message: M) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a fetch error from a response status
    pub fn fetch<U: Into<String>>(url: U, status: reqwest::StatusCode) -> Self {
        Self::Fetch {
            url: url.into(),
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }
}

impl StorageError {
    /// Create an I/O error for the given path
    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a write error for the given path
    pub fn write<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
