//! Conversions between epoch seconds and the continuous day-number scale.
//!
//! Day-numbers count days from the Common Era: 0001-01-01T00:00Z is `1.0` and
//! 1970-01-01T00:00Z is `719163.0`, so `floor(day_number)` equals chrono's
//! `num_days_from_ce()` of the UTC calendar date. One day is exactly `1.0`.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

pub const SECONDS_PER_DAY: f64 = 86_400.0;
/// Day-number of the Unix epoch.
pub const UNIX_EPOCH_DAY_NUMBER: f64 = 719_163.0;

pub fn from_epoch(epoch_seconds: f64) -> f64 {
    epoch_seconds / SECONDS_PER_DAY + UNIX_EPOCH_DAY_NUMBER
}

pub fn to_epoch(day_number: f64) -> f64 {
    (day_number - UNIX_EPOCH_DAY_NUMBER) * SECONDS_PER_DAY
}

/// UTC calendar date containing `day_number`, if it is representable.
pub fn to_date(day_number: f64) -> Option<NaiveDate> {
    if !day_number.is_finite() {
        return None;
    }
    let days = day_number.floor();
    if days < i32::MIN as f64 || days > i32::MAX as f64 {
        return None;
    }
    NaiveDate::from_num_days_from_ce_opt(days as i32)
}

/// Day-number of midnight UTC on `date`.
pub fn from_date(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

pub fn to_datetime(day_number: f64) -> Option<DateTime<Utc>> {
    let epoch = to_epoch(day_number);
    if !epoch.is_finite() {
        return None;
    }
    let secs = epoch.floor();
    let nanos = ((epoch - secs) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(secs as i64, nanos)
}
