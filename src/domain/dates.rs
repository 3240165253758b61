//! Calendar-day parsing and labelling shared by the journal views.

use chrono::{Datelike, NaiveDate, Weekday};

use super::error::JournalError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Weekday names in display order (Sunday first).
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, JournalError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| JournalError::validation(field, format!("expected YYYY-MM-DD, got {value:?}")))
}

/// Parses a `YYYY-MM` month key into (year, month).
pub fn parse_month(field: &str, value: &str) -> Result<(i32, u32), JournalError> {
    let value = value.trim();
    NaiveDate::parse_from_str(&format!("{value}-01"), DATE_FORMAT)
        .map(|d| (d.year(), d.month()))
        .map_err(|_| JournalError::validation(field, format!("expected YYYY-MM, got {value:?}")))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Index into [`WEEKDAY_NAMES`].
pub fn weekday_index(weekday: Weekday) -> usize {
    weekday.num_days_from_sunday() as usize
}

pub fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

pub fn last_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1).and_then(|d| d.pred_opt())
}
