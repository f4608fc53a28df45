//! Discovery helpers: which expiries, strikes and trading days exist.
//!
//! File names are matched strictly against `NIFTY-{DDMMMYY}-{DDMMMYY}.csv`.
//! A candidate CSV that does not fit the grammar is reported as an error
//! instead of being skipped, so gaps in the data are not hidden.

use std::fs;
use std::path::Path;

use tracing::info;

use super::engine::{MarketDataEngine, QueryFilter};
use crate::data::dates::{parse_date_token, parse_month_abbrev, MonthKey};
use crate::data::paths::{parse_option_file_name, OptionFileName, OPTION_FILE_PREFIX};
use crate::error::{MarketDataError, Result};

fn folder_entries(folder: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    Ok(names)
}

fn strict_parse(name: &str, folder: &Path) -> Result<OptionFileName> {
    parse_option_file_name(name).ok_or_else(|| {
        MarketDataError::Format(format!(
            "[FORMAT ERROR] Unexpected file name '{name}' in {}.\n  \
             Expected: NIFTY-{{EXPIRY}}-{{TRADEDATE}}.csv  (e.g. 'NIFTY-01FEB24-01JAN24.csv')\n  \
             Rename or remove the file so discovery does not miss data.",
            folder.display()
        ))
    })
}

impl MarketDataEngine {
    /// Expiry tokens with a chain file for `trade_date`, sorted and unique.
    pub fn list_expiries(&self, trade_date: &str) -> Result<Vec<String>> {
        let trade_day = parse_date_token("trade_date", trade_date)?;
        let month = MonthKey::from_date(trade_day);
        let folder = self.layout().month_dir(month);

        if !folder.is_dir() {
            return Err(MarketDataError::file_not_available(
                &folder,
                format!(
                    "[FILE NOT FOUND] No data folder found for '{month}'.\n  \
                     Expected: {}\n  \
                     The dataset for this month may not yet be loaded.",
                    folder.display()
                ),
            ));
        }

        let files = folder_entries(&folder)?;
        let mut expiries = Vec::new();
        for name in files
            .iter()
            .filter(|f| f.ends_with(".csv") && f.contains(trade_date))
        {
            let parsed = strict_parse(name, &folder)?;
            if parsed.trade_date == trade_date {
                expiries.push(parsed.expiry);
            }
        }
        expiries.sort();
        expiries.dedup();

        if expiries.is_empty() {
            let preview: Vec<&String> = files.iter().take(5).collect();
            info!(
                "[INFO] No expiry files found for trade_date='{trade_date}'.\n  \
                 All files in folder: {preview:?} ..."
            );
        }

        Ok(expiries)
    }

    /// Distinct strikes in one chain file, ascending.
    pub fn list_strikes(&self, expiry: &str, trade_date: &str) -> Result<Vec<i64>> {
        Ok(self
            .query_options(expiry, trade_date, &QueryFilter::default())?
            .strikes())
    }

    /// Trade date tokens with at least one chain file in the month folder.
    ///
    /// `month` is a three-letter abbreviation such as `"JAN"`.
    pub fn list_trading_days(&self, year: i32, month: &str) -> Result<Vec<String>> {
        let month_key = MonthKey::new(year, parse_month_abbrev(month)?)?;
        let folder = self.layout().month_dir(month_key);

        if !folder.is_dir() {
            return Err(MarketDataError::file_not_available(
                &folder,
                format!(
                    "[FILE NOT FOUND] Folder not found: {}\n  \
                     Check that year={year} and month='{month}' are correct.",
                    folder.display()
                ),
            ));
        }

        let mut days = Vec::new();
        for name in folder_entries(&folder)?
            .iter()
            .filter(|f| f.starts_with(OPTION_FILE_PREFIX) && f.ends_with(".csv"))
        {
            days.push(strict_parse(name, &folder)?.trade_date);
        }
        days.sort();
        days.dedup();
        Ok(days)
    }
}
