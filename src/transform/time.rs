//! Timestamp and calendar derivation
//!
//! `ts` columns hold epoch milliseconds. They are turned into wall-clock
//! timestamps in a configured zone (the process's local zone by default) and
//! stored as zone-less `Timestamp(Microsecond)` values.
//!
//! Calendar fields are derived from `start_time` by the query engine:
//! - `week` is the ISO-8601 week number (1-53)
//! - `weekday` counts from Sunday: Sunday = 1 ... Saturday = 7

use crate::error::{Error, Result};
use crate::types::TimeZoneSetting;
use arrow::array::{Array, Int64Array, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, TimeUnit};
use chrono::{DateTime, NaiveDateTime};

/// Arrow type of derived `start_time` columns
pub const START_TIME_TYPE: DataType = DataType::Timestamp(TimeUnit::Microsecond, None);

/// Convert epoch milliseconds to wall-clock time in `tz`
///
/// The millisecond remainder is kept, so `1542124960796` maps to
/// `...:40.796` exactly. Returns `None` for instants chrono cannot represent.
pub fn epoch_millis_to_timestamp(ts: i64, tz: TimeZoneSetting) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(ts).map(|instant| tz.to_wall_clock(instant))
}

/// Convert epoch milliseconds to wall-clock time in the process's local zone
pub fn epoch_millis_to_local_timestamp(ts: i64) -> Option<NaiveDateTime> {
    epoch_millis_to_timestamp(ts, TimeZoneSetting::Local)
}

/// A calendar field derived from a timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarField {
    Hour,
    Day,
    Week,
    Month,
    Year,
    Weekday,
}

impl CalendarField {
    /// Column name of the field
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::Weekday => "weekday",
        }
    }

    /// SQL expression computing the field from a timestamp column
    pub fn sql(&self, column: &str) -> String {
        match self {
            Self::Hour => format!("hour({column})::INTEGER"),
            Self::Day => format!("day({column})::INTEGER"),
            Self::Week => format!("week({column})::INTEGER"),
            Self::Month => format!("month({column})::INTEGER"),
            Self::Year => format!("year({column})::INTEGER"),
            Self::Weekday => format!("(dayofweek({column}) + 1)::INTEGER"),
        }
    }
}

/// Derive a `start_time` column from an epoch-millisecond column
pub fn start_time_array(ts: &Int64Array, tz: TimeZoneSetting) -> Result<TimestampMicrosecondArray> {
    ts.iter()
        .map(|value| match value {
            None => Ok(None),
            Some(ms) => epoch_millis_to_timestamp(ms, tz)
                .map(|dt| Some(dt.and_utc().timestamp_micros()))
                .ok_or_else(|| Error::transform(format!("Timestamp out of range: {ms}"))),
        })
        .collect()
}

/// Downcast helper for epoch-millisecond columns
pub fn as_epoch_millis(array: &dyn Array) -> Result<&Int64Array> {
    array
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| Error::transform("Expected an Int64 epoch-millisecond column"))
}
