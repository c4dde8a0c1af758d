//! Time-of-day parsing for instrumentation timestamps.
//!
//! Instrumentation logs carry `HH:MM:SS.mmm` timestamps with no date part.
//! Every timestamp is anchored to a fixed nominal date so deltas can be
//! computed with plain `NaiveDateTime` arithmetic. Logs that straddle
//! midnight are not supported.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// The nominal calendar date every time-of-day is anchored to.
fn nominal_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2014, 1, 1).expect("fixed nominal date is valid")
}

/// Parse an `HH:MM:SS.mmm` string into an instant on the nominal date.
///
/// The scanner's line regex constrains the shape, but not the field ranges;
/// `25:00:00.000` reaches this function and must fail here.
pub fn parse_timestamp(ts: &str) -> Result<NaiveDateTime> {
    let time = NaiveTime::parse_from_str(ts, "%H:%M:%S%.3f")
        .with_context(|| format!("invalid timestamp {ts:?}"))?;
    Ok(nominal_date().and_time(time))
}

/// Milliseconds from `a` to `b`, truncated toward zero.
pub fn delta_ms(a: NaiveDateTime, b: NaiveDateTime) -> i64 {
    (b - a).num_milliseconds()
}

/// Render an instant back to the log's `HH:MM:SS.mmm` form.
pub fn format_timestamp(t: NaiveDateTime) -> String {
    t.format("%H:%M:%S%.3f").to_string()
}
