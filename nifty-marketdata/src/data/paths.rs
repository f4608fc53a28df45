//! Folder convention of the historical dataset.
//!
//! ```text
//! {root}/{YEAR}/{YEAR}{MON}/NIFTY-{EXPIRY}-{TRADEDATE}.csv   option chain
//! {root}/{YEAR}/{YEAR}Nifty/Nifty-{YEAR}{MON}.csv            spot series
//! ```
//!
//! Everything here is a pure path computation; callers check existence.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::dates::{parse_date_token, MonthKey};

/// Prefix of option chain file names.
pub const OPTION_FILE_PREFIX: &str = "NIFTY";

/// Prefix of spot file names.
pub const SPOT_FILE_PREFIX: &str = "Nifty";

/// Resolves dataset paths under a root directory.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `{root}/{year}`
    pub fn year_dir(&self, year: i32) -> PathBuf {
        self.root.join(year.to_string())
    }

    /// `{root}/{year}/{year}Nifty`
    pub fn spot_dir(&self, year: i32) -> PathBuf {
        self.year_dir(year).join(format!("{year}{SPOT_FILE_PREFIX}"))
    }

    /// `{root}/{year}/{year}Nifty/Nifty-{month_key}.csv`
    pub fn spot_file(&self, month: MonthKey) -> PathBuf {
        self.spot_dir(month.year())
            .join(format!("{SPOT_FILE_PREFIX}-{month}.csv"))
    }

    /// `{root}/{year}/{month_key}`
    pub fn month_dir(&self, month: MonthKey) -> PathBuf {
        self.year_dir(month.year()).join(month.to_string())
    }

    /// Option chain file for an expiry traded on `trade_date`.
    ///
    /// The tokens are used verbatim in the file name; the folder comes from
    /// the parsed trade date.
    pub fn option_file(&self, expiry: &str, trade_date: &str, trade_day: NaiveDate) -> PathBuf {
        self.month_dir(MonthKey::from_date(trade_day))
            .join(option_file_name(expiry, trade_date))
    }
}

/// `NIFTY-{expiry}-{trade_date}.csv`
pub fn option_file_name(expiry: &str, trade_date: &str) -> String {
    format!("{OPTION_FILE_PREFIX}-{expiry}-{trade_date}.csv")
}

/// Tokens extracted from a conforming option file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionFileName {
    pub expiry: String,
    pub trade_date: String,
}

/// Strictly match `NIFTY-{DDMMMYY}-{DDMMMYY}.csv`.
///
/// Month names must be uppercase, as written by [`option_file_name`].
pub fn parse_option_file_name(name: &str) -> Option<OptionFileName> {
    let stem = name
        .strip_prefix(OPTION_FILE_PREFIX)?
        .strip_prefix('-')?
        .strip_suffix(".csv")?;
    let (expiry, trade_date) = stem.split_once('-')?;

    if stem.bytes().any(|b| b.is_ascii_lowercase())
        || parse_date_token("expiry", expiry).is_err()
        || parse_date_token("trade_date", trade_date).is_err()
    {
        return None;
    }

    Some(OptionFileName {
        expiry: expiry.to_string(),
        trade_date: trade_date.to_string(),
    })
}
