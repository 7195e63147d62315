use chrono::{Months, NaiveDate, NaiveTime, TimeDelta, Timelike};

use crate::error::ApiError;

/// Wire format of attendance times.
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Parses a wall-clock time. Leap seconds (`23:59:60`) are rejected, a MySQL
/// `TIME` cannot hold them.
pub fn parse_event_time(raw: &str) -> Result<NaiveTime, ApiError> {
    NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT)
        .ok()
        .filter(|t| t.nanosecond() < 1_000_000_000)
        .ok_or_else(|| ApiError::InvalidTime(raw.to_string()))
}

/// Full English weekday name, e.g. `Friday`.
pub fn day_of_week(date: NaiveDate) -> String {
    date.format("%A").to_string()
}

/// Elapsed time between two times of the same day, expressed as a time of day
/// (`09:00:00` .. `17:30:00` gives `08:30:00`).
///
/// Returns `None` when `end` precedes `start`.
pub fn elapsed_as_time(start: NaiveTime, end: NaiveTime) -> Option<NaiveTime> {
    if end < start {
        return None;
    }
    let delta: TimeDelta = end - start;
    Some(NaiveTime::MIN + delta)
}

/// `[first day of month, first day of next month)` for a month filter.
pub fn month_range(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), ApiError> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid month {month}/{year}")))?;
    let end = start
        .checked_add_months(Months::new(1))
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid month {month}/{year}")))?;
    Ok((start, end))
}
