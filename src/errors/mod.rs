//! Centralized error handling for the broadcast recorder
//!
//! Errors are grouped by the layer that raises them:
//!
//! - **Schedule Errors**: provider HTTP failures, malformed bodies, empty schedules
//! - **Storage Errors**: renames, hashing reads and metadata writes in the save directory
//!
//! # Usage
//!
//! ```rust
//! use broadcast_recorder::errors::{AppError, AppResult};
//!
//! async fn example_function() -> AppResult<String> {
//!     Ok("success".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Schedule Results
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Convenience type alias for Storage Results
pub type StorageResult<T> = Result<T, StorageError>;
