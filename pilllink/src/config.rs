//! Application configuration constants
//!
//! Central location for display constants, reminder window limits
//! and validation boundaries used throughout the library.

// ===== Calendar Markers =====

/// Dot color for a day with exactly one confirmed intake
pub const SINGLE_DOSE_COLOR: &str = "#10B981";

/// Dot color for a day with two or more confirmed intakes
pub const MULTI_DOSE_COLOR: &str = "#4F8EF7";

// ===== Reminder Window =====

/// Minutes in one wall-clock day
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Default half-width of the due window around the current time
pub const DEFAULT_TOLERANCE_MINUTES: u32 = 60;

/// Maximum tolerance accepted from settings (half a day).
/// Above this the direct and wrapped windows overlap.
pub const MAX_TOLERANCE_MINUTES: u32 = MINUTES_PER_DAY / 2;

// ===== Reminder Runner =====

/// Default polling interval of the reminder runner in seconds
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Minimum polling interval in seconds
pub const MIN_POLL_INTERVAL_SECS: u64 = 5;

/// Maximum polling interval in seconds (1 hour, longer skips whole windows)
pub const MAX_POLL_INTERVAL_SECS: u64 = 3_600;

/// Capacity of the reminder event broadcast channel
pub const REMINDER_CHANNEL_CAPACITY: usize = 64;

// ===== Remote API =====

/// Default base URL of the PillLink backend
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

/// Request timeout for backend calls in seconds
pub const API_TIMEOUT_SECS: u64 = 15;

/// User agent sent with every backend request
pub const API_USER_AGENT: &str = concat!("pilllink/", env!("CARGO_PKG_VERSION"));
