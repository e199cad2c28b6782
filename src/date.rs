//! Conversion between the date as typed in the forms (`dd/mm/yyyy`) and the
//! date as stored (`yyyy-mm-dd`).

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DateError {
    #[error("invalidDateFormat")]
    Format,
    #[error("invalidDateCharacters")]
    Characters,
    #[error("invalidDateMonth")]
    Month,
    #[error("invalidDateDay")]
    Day,
}

impl DateError {
    /// Code reported next to the form field.
    pub fn code(&self) -> &'static str {
        match self {
            DateError::Format => "invalidDateFormat",
            DateError::Characters => "invalidDateCharacters",
            DateError::Month => "invalidDateMonth",
            DateError::Day => "invalidDateDay",
        }
    }
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

fn only_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn checked_date(year: i32, month: u32, day: u32) -> Result<NaiveDate, DateError> {
    if !(1..=12).contains(&month) {
        return Err(DateError::Month);
    }
    if day < 1 || day > days_in_month(year, month) {
        return Err(DateError::Day);
    }
    NaiveDate::from_ymd_opt(year, month, day).ok_or(DateError::Day)
}

/// Validates a `dd/mm/yyyy` entry.
pub fn parse_ui(value: &str) -> Result<NaiveDate, DateError> {
    // an unfinished input mask still carries its placeholders
    if value.contains('_') || value.len() != 10 || !value.is_ascii() {
        return Err(DateError::Format);
    }
    if &value[2..3] != "/" || &value[5..6] != "/" {
        return Err(DateError::Format);
    }

    let (day, month, year) = (&value[0..2], &value[3..5], &value[6..10]);
    if !only_digits(day) || !only_digits(month) || !only_digits(year) {
        return Err(DateError::Characters);
    }

    // digits only, so the parses can't fail
    let day: u32 = day.parse().map_err(|_| DateError::Characters)?;
    let month: u32 = month.parse().map_err(|_| DateError::Characters)?;
    let year: i32 = year.parse().map_err(|_| DateError::Characters)?;

    checked_date(year, month, day)
}

/// Reads a stored `yyyy-mm-dd` date. Anything after the tenth character (a
/// time of day, a zone) is ignored.
pub fn parse_storage(value: &str) -> Result<NaiveDate, DateError> {
    let value = value.trim();
    let day_part = match value.get(..10) {
        Some(d) if d.is_ascii() => d,
        _ => return Err(DateError::Format),
    };
    if &day_part[4..5] != "-" || &day_part[7..8] != "-" {
        return Err(DateError::Format);
    }

    let (year, month, day) = (&day_part[0..4], &day_part[5..7], &day_part[8..10]);
    if !only_digits(year) || !only_digits(month) || !only_digits(day) {
        return Err(DateError::Characters);
    }

    let year: i32 = year.parse().map_err(|_| DateError::Characters)?;
    let month: u32 = month.parse().map_err(|_| DateError::Characters)?;
    let day: u32 = day.parse().map_err(|_| DateError::Characters)?;

    checked_date(year, month, day)
}

/// Accepts any of the forms a birth date arrives in: `dd/mm/yyyy`,
/// `yyyy-mm-dd` or an ISO date-time.
pub fn parse_birth_date(value: &str) -> Result<NaiveDate, DateError> {
    let value = value.trim();
    if value.contains('/') {
        parse_ui(value)
    } else {
        parse_storage(value)
    }
}

pub fn to_ui(date: NaiveDate) -> String {
    format!("{:02}/{:02}/{:04}", date.day(), date.month(), date.year())
}

pub fn to_storage(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

pub fn ui_to_storage(value: &str) -> Result<String, DateError> {
    parse_ui(value).map(to_storage)
}

pub fn storage_to_ui(value: &str) -> Result<String, DateError> {
    parse_storage(value).map(to_ui)
}

/// serde helpers for dates that travel as `yyyy-mm-dd`.
pub mod iso {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::to_storage(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_birth_date(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn leap_years() {
        assert!(is_leap_year(2000));
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(2023));
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2100, 2), 28);
    }

    #[test]
    fn ui_errors_are_named() {
        assert_eq!(parse_ui("19/02/197_"), Err(DateError::Format));
        assert_eq!(parse_ui("19-02-1972"), Err(DateError::Format));
        assert_eq!(parse_ui("1/2/1972"), Err(DateError::Format));
        assert_eq!(parse_ui("aa/02/1972"), Err(DateError::Characters));
        assert_eq!(parse_ui("19/13/1972"), Err(DateError::Month));
        assert_eq!(parse_ui("19/00/1972"), Err(DateError::Month));
        assert_eq!(parse_ui("31/04/1972"), Err(DateError::Day));
        assert_eq!(parse_ui("00/04/1972"), Err(DateError::Day));
        assert_eq!(parse_ui("29/02/1900"), Err(DateError::Day));
        assert!(parse_ui("29/02/2000").is_ok());
    }

    #[test]
    fn birth_date_ignores_time_of_day() {
        let expected = NaiveDate::from_ymd_opt(1972, 2, 19).unwrap();
        assert_eq!(parse_birth_date("1972-02-19").unwrap(), expected);
        assert_eq!(parse_birth_date("1972-02-19T03:00:00.000Z").unwrap(), expected);
        assert_eq!(parse_birth_date("1972-02-19T23:59:59-03:00").unwrap(), expected);
        assert_eq!(parse_birth_date("19/02/1972").unwrap(), expected);
    }

    #[test]
    fn storage_rejects_garbage() {
        assert_eq!(parse_storage("1972/02/19"), Err(DateError::Format));
        assert_eq!(parse_storage("72-02-19"), Err(DateError::Format));
        assert_eq!(parse_storage("1972-02-30"), Err(DateError::Day));
    }

    #[test]
    fn multibyte_input_is_a_format_error() {
        assert_eq!(parse_birth_date("123é-02-19"), Err(DateError::Format));
        assert_eq!(parse_birth_date("1972-0é-19T00"), Err(DateError::Format));
        assert_eq!(parse_birth_date("1972-02-1é"), Err(DateError::Format));
        assert_eq!(parse_birth_date("19/0é/1972"), Err(DateError::Format));
    }

    proptest! {
        #[test]
        fn feb_29_only_in_leap_years(year in 1i32..=9999) {
            let res = parse_ui(&format!("29/02/{:04}", year));
            let leap = year % 4 == 0 && (year % 100 != 0 || year % 400 == 0);
            prop_assert_eq!(res.is_ok(), leap);
        }

        #[test]
        fn ui_storage_ui_is_identity(year in 1i32..=9999, month in 1u32..=12, day in 1u32..=31) {
            prop_assume!(day <= days_in_month(year, month));
            let ui = format!("{:02}/{:02}/{:04}", day, month, year);
            let stored = ui_to_storage(&ui).unwrap();
            prop_assert_eq!(storage_to_ui(&stored).unwrap(), ui);
        }
    }
}
