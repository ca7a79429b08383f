//! Formatting helpers for reading values and event timestamps.
//!
//! Values are turned into text at the probe boundary, so every source picks
//! the precision that suits its sensor.

use chrono::{DateTime, Utc};

/// Format with two fixed decimals: `21.456` → `"21.46"`.
pub fn fixed2(value: f64) -> String {
    format!("{:.2}", value)
}

/// Format with the shortest text that round-trips: `12.0` → `"12"`, `2.5` → `"2.5"`.
pub fn plain(value: f64) -> String {
    value.to_string()
}

/// Unix epoch seconds rounded to the nearest millisecond: `"1700000000.123"`.
pub fn epoch_seconds(ts: DateTime<Utc>) -> String {
    let nanos = i64::from(ts.timestamp_subsec_nanos());
    let millis = ts.timestamp() * 1000 + (nanos + 500_000) / 1_000_000;
    let sign = if millis < 0 { "-" } else { "" };
    let millis = millis.unsigned_abs();
    format!("{}{}.{:03}", sign, millis / 1000, millis % 1000)
}
