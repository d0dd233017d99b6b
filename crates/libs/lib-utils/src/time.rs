//! # Time Utilities
//!
//! Clock access and timestamp formatting shared by the store and the HTTP layer.

use chrono::{DateTime, SecondsFormat, Utc};

/// Current UTC time.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// ISO-8601 with millisecond precision and a `Z` suffix, e.g. `2025-01-01T12:00:00.123Z`.
pub fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
