//! Date and time tokens used throughout the dataset.
//!
//! Trade dates and expiries are written as `DDMMMYY` (e.g. `01JAN24`), month
//! folders and spot files are keyed by `YYYYMON` (e.g. `2024JAN`), and the
//! intraday `datetime` column of an option file only carries a time of day.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{MarketDataError, Result};

/// chrono format for a `DDMMMYY` token.
pub const DATE_TOKEN_FORMAT: &str = "%d%b%y";

const MONTH_ABBREVS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

const TIME_BOUND_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

/// Parse a `DDMMMYY` token. `field` names the argument in the error message.
pub fn parse_date_token(field: &str, token: &str) -> Result<NaiveDate> {
    let well_formed = token.len() == 7
        && token.is_ascii()
        && token[..2].bytes().all(|b| b.is_ascii_digit())
        && token[2..5].bytes().all(|b| b.is_ascii_alphabetic())
        && token[5..].bytes().all(|b| b.is_ascii_digit());

    let parsed = if well_formed {
        NaiveDate::parse_from_str(token, DATE_TOKEN_FORMAT).ok()
    } else {
        None
    };

    parsed.ok_or_else(|| {
        MarketDataError::InvalidParameter(format!(
            "[PARAMETER ERROR] {field} '{token}' is not a valid date.\n  \
             Required format: DDMMMYY  (e.g. '01JAN24', '15MAR25')"
        ))
    })
}

/// Canonical uppercase `DDMMMYY` token for a date.
pub fn format_date_token(date: NaiveDate) -> String {
    format!(
        "{:02}{}{:02}",
        date.day(),
        MONTH_ABBREVS[date.month0() as usize],
        date.year().rem_euclid(100)
    )
}

/// Month number (1-12) for a three-letter English abbreviation, any case.
pub fn parse_month_abbrev(month: &str) -> Result<u32> {
    let upper = month.to_ascii_uppercase();
    MONTH_ABBREVS
        .iter()
        .position(|m| *m == upper)
        .map(|idx| idx as u32 + 1)
        .ok_or_else(|| {
            MarketDataError::InvalidParameter(format!(
                "[PARAMETER ERROR] month '{month}' is not a valid month abbreviation.\n  \
                 Required: three letters, e.g. 'JAN', 'FEB', 'DEC'"
            ))
        })
}

/// A calendar month key such as `2024JAN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// Month `1..=12` of a four-digit year.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) || !(0..=9999).contains(&year) {
            return Err(MarketDataError::InvalidParameter(format!(
                "[PARAMETER ERROR] year={year}, month={month} is not a valid month.\n  \
                 Required: a four-digit year and a month between 1 and 12"
            )));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Parse a `YYYYMON` key.
    pub fn parse(key: &str) -> Result<Self> {
        let invalid = || {
            MarketDataError::InvalidParameter(format!(
                "[PARAMETER ERROR] month key '{key}' is not valid.\n  \
                 Required format: YYYYMON  (e.g. '2024JAN', '2025MAR')"
            ))
        };

        if key.len() != 7 || !key.is_ascii() || !key[..4].bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let year: i32 = key[..4].parse().map_err(|_| invalid())?;
        let month = parse_month_abbrev(&key[4..]).map_err(|_| invalid())?;
        Self::new(year, month)
    }

    pub fn month_abbrev(&self) -> &'static str {
        MONTH_ABBREVS[self.month as usize - 1]
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{}", self.year, self.month_abbrev())
    }
}

/// Parse an inclusive `start`/`end` query bound.
pub fn parse_time_bound(field: &str, value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    let parsed = TIME_BOUND_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        });

    parsed.ok_or_else(|| {
        MarketDataError::InvalidParameter(format!(
            "[PARAMETER ERROR] '{field}' could not be parsed as a datetime.\n  \
             Received: '{value}'\n  \
             Expected format: 'YYYY-MM-DD HH:MM'  (e.g. '2024-01-01 09:30')"
        ))
    })
}

/// Parse a `HH:MM` snapshot time.
pub fn parse_snapshot_time(value: &str) -> Result<NaiveTime> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| {
            MarketDataError::InvalidParameter(format!(
                "[PARAMETER ERROR] snapshot_time '{value}' could not be parsed.\n  \
                 Expected format: 'HH:MM'  (e.g. '10:00')"
            ))
        })
}

/// Parse the intraday `datetime` field of an option file.
///
/// Usually a bare time of day; a full datetime is accepted and only its time
/// component is kept.
pub fn parse_intraday_time(value: &str) -> Option<NaiveTime> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .ok()
        .or_else(|| parse_datetime(trimmed).map(|dt| dt.time()))
}

/// Parse a full timestamp as found in spot files.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
}
