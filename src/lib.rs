pub mod config;
pub mod errors;
pub mod models;
pub mod recording;
pub mod schedule;
pub mod utils;
