/// Configuration default values
///
/// Kept in one place so the written default config and serde defaults agree.
// Schedule provider defaults
pub const DEFAULT_SCHEDULE_URL: &str = "https://nwapi.nhk.jp/nhkworld";
pub const DEFAULT_STATION_TIMEZONE: &str = "Asia/Tokyo";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// Schedule cache defaults
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60 * 60;
pub const DEFAULT_LOOKBEHIND_SECS: u64 = 2 * 60 * 60;
pub const DEFAULT_LOOKAHEAD_SECS: u64 = 48 * 60 * 60;
pub const MAX_WINDOW_SECS: u64 = 31 * 24 * 60 * 60;

// Upper bound for any other configured duration
pub const MAX_DURATION_SECS: u64 = 366 * 24 * 60 * 60;

// Storage defaults
pub const DEFAULT_SAVE_DIR: &str = "./recordings";
pub const DEFAULT_MAX_IN_PROGRESS_AGE_SECS: u64 = 3 * 60 * 60;

// Recording defaults
pub const DEFAULT_SAFETY_BUFFER_SECS: u64 = 0;
