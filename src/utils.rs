//! Utility functions for the broadcast recorder
//!
//! - `utils::clock` for the injectable time source
//! - `utils::time` for station day keys and timestamp parsing

pub mod clock;
pub mod time;
