//! Local calendar-date arithmetic.
//!
//! # Responsibility
//! - Parse and format boundary `YYYY-MM-DD` dates and `HH:MM` times.
//! - Step dates by days, weeks, months and years.
//! - Produce the visible date ranges of week and month views.
//!
//! # Invariants
//! - Dates are zone-free `NaiveDate` values; stepping never drifts into an
//!   adjacent day because no time-of-day or offset is involved.
//! - Month and year steps clamp to the last day of the target month
//!   (Jan 31 + 1 month = Feb 28/29).

use chrono::{Datelike, Days, Months, NaiveDate, NaiveTime, Timelike, Weekday};
use thiserror::Error;

/// Normalized start time of an all-day event.
pub const ALL_DAY_START: NaiveTime = NaiveTime::MIN;

/// Normalized end time of an all-day event.
pub const ALL_DAY_END: NaiveTime = match NaiveTime::from_hms_opt(23, 59, 0) {
    Some(time) => time,
    None => NaiveTime::MIN,
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// Boundary parse failures for dates and times.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    #[error("invalid date `{0}`; expected YYYY-MM-DD")]
    Date(String),
    #[error("invalid time `{0}`; expected HH:MM")]
    Time(String),
}

/// Parses a strict `YYYY-MM-DD` calendar date.
pub fn parse_local_date(value: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = value.trim();
    // chrono accepts unpadded fields; the boundary format is fixed width.
    if trimmed.len() != 10 {
        return Err(DateParseError::Date(value.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| DateParseError::Date(value.to_string()))
}

/// Formats a calendar date as `YYYY-MM-DD`.
pub fn format_local_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parses a 24-hour `HH:MM` time.
pub fn parse_time_hhmm(value: &str) -> Result<NaiveTime, DateParseError> {
    let trimmed = value.trim();
    if trimmed.len() != 5 {
        return Err(DateParseError::Time(value.to_string()));
    }
    NaiveTime::parse_from_str(trimmed, TIME_FORMAT)
        .map_err(|_| DateParseError::Time(value.to_string()))
}

/// Formats a time as `HH:MM`.
pub fn format_time_hhmm(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Minutes elapsed since midnight.
pub fn minutes_since_midnight(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

pub fn add_days(date: NaiveDate, days: u64) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(days))
}

pub fn add_weeks(date: NaiveDate, weeks: u64) -> Option<NaiveDate> {
    add_days(date, weeks.checked_mul(7)?)
}

/// Adds whole months, clamping to the end of a shorter target month.
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

/// Adds whole years, clamping Feb 29 to Feb 28 in non-leap years.
pub fn add_years(date: NaiveDate, years: u32) -> Option<NaiveDate> {
    add_months(date, years.checked_mul(12)?)
}

/// Returns the seven dates of the week containing `date`.
pub fn week_dates(date: NaiveDate, first_day: Weekday) -> Vec<NaiveDate> {
    let start = start_of_week(date, first_day);
    start.iter_days().take(7).collect()
}

/// Returns whole weeks covering the month that contains `date`.
///
/// The grid starts on `first_day` on or before the 1st and ends on the last
/// day of the week holding the month's final day.
pub fn month_grid_dates(date: NaiveDate, first_day: Weekday) -> Vec<NaiveDate> {
    let first_of_month = date.with_day(1).unwrap_or(date);
    let last_of_month = add_months(first_of_month, 1)
        .and_then(|next| next.pred_opt())
        .unwrap_or(first_of_month);

    let grid_start = start_of_week(first_of_month, first_day);
    let grid_end = start_of_week(last_of_month, first_day)
        .checked_add_days(Days::new(6))
        .unwrap_or(last_of_month);

    grid_start
        .iter_days()
        .take_while(|day| *day <= grid_end)
        .collect()
}

fn start_of_week(date: NaiveDate, first_day: Weekday) -> NaiveDate {
    let back =
        (7 + date.weekday().num_days_from_monday() - first_day.num_days_from_monday()) % 7;
    date.checked_sub_days(Days::new(u64::from(back)))
        .unwrap_or(date)
}
