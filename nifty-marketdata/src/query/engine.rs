//! Query engine over the historical NIFTY dataset.
//!
//! A query runs: load chain file -> standardize -> filter -> merge spot.
//! Filters are applied in a fixed order (strikes, option type, start, end,
//! minimum volume) and the first invalid argument fails the call.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use super::merge::merge_spot;
use super::standardize::standardize;
use crate::data::cache::SpotCache;
use crate::data::dates::{parse_date_token, parse_time_bound, MonthKey};
use crate::data::loader::load_option_rows;
use crate::data::paths::DataLayout;
use crate::data::types::{OptionType, RawOptionRow, SpotSeries};
use crate::error::{MarketDataError, Result};
use crate::frame::OptionFrame;

/// Filters for [`MarketDataEngine::query_options`].
///
/// `None` means "do not filter". Time bounds are inclusive and written
/// `YYYY-MM-DD HH:MM`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilter {
    pub strikes: Option<Vec<f64>>,
    pub option_type: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub min_volume: u64,
    pub raise_if_empty: bool,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strikes<I, S>(mut self, strikes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<f64>,
    {
        self.strikes = Some(strikes.into_iter().map(Into::into).collect());
        self
    }

    pub fn option_type(mut self, option_type: impl Into<String>) -> Self {
        self.option_type = Some(option_type.into());
        self
    }

    pub fn start(mut self, start: impl Into<String>) -> Self {
        self.start = Some(start.into());
        self
    }

    pub fn end(mut self, end: impl Into<String>) -> Self {
        self.end = Some(end.into());
        self
    }

    /// Restrict to a single instant: `start == end == timestamp`.
    pub fn at(self, timestamp: impl Into<String>) -> Self {
        let ts = timestamp.into();
        self.start(ts.clone()).end(ts)
    }

    pub fn min_volume(mut self, min_volume: u64) -> Self {
        self.min_volume = min_volume;
        self
    }

    pub fn raise_if_empty(mut self, raise: bool) -> Self {
        self.raise_if_empty = raise;
        self
    }

    fn parsed_option_type(&self) -> Result<Option<OptionType>> {
        match self.option_type.as_deref() {
            None => Ok(None),
            Some(code) => OptionType::parse(code).map(Some).ok_or_else(|| {
                MarketDataError::InvalidParameter(format!(
                    "[PARAMETER ERROR] option_type must be 'C' (Call) or 'P' (Put).\n  \
                     Received: '{code}'"
                ))
            }),
        }
    }

    fn describe(&self) -> String {
        let opt = |v: &Option<String>| v.clone().unwrap_or_else(|| "None".to_string());
        let strikes = match &self.strikes {
            Some(s) => format!("{s:?}"),
            None => "None".to_string(),
        };
        format!(
            "    strikes      = {strikes}\n    \
             option_type  = {}\n    \
             time window  = [{}, {}]\n    \
             min_volume   = {}",
            opt(&self.option_type),
            opt(&self.start),
            opt(&self.end),
            self.min_volume
        )
    }
}

/// Query engine bound to one dataset root.
///
/// Each engine owns its spot cache, so engines on different roots never
/// share state.
#[derive(Debug)]
pub struct MarketDataEngine {
    layout: DataLayout,
    spot_cache: SpotCache,
}

impl MarketDataEngine {
    /// Create an engine over `base_dir`, which must be an existing directory.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        if !base_dir.is_dir() {
            return Err(MarketDataError::file_not_available(
                &base_dir,
                format!(
                    "[INIT ERROR] base_dir does not exist or is not accessible:\n  \
                     -> {}\n  \
                     Please verify the path and ensure the shared drive is mounted.",
                    base_dir.display()
                ),
            ));
        }

        info!("[NiftyMarketData] Engine initialised. Base directory: {}", base_dir.display());
        Ok(Self {
            layout: DataLayout::new(base_dir),
            spot_cache: SpotCache::new(),
        })
    }

    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    /// Spot series for a `YYYYMON` month key, cached after the first load.
    pub fn load_spot_month(&self, month_key: &str) -> Result<Arc<SpotSeries>> {
        let month = MonthKey::parse(month_key)?;
        self.spot_cache.load(&self.layout, month)
    }

    /// Empty the spot cache. Returns the number of months removed.
    pub fn clear_spot_cache(&self) -> usize {
        self.spot_cache.clear()
    }

    /// Cached months and their row counts.
    pub fn cache_status(&self) -> BTreeMap<String, usize> {
        self.spot_cache.status()
    }

    /// Load the raw chain file for `expiry` traded on `trade_date`.
    pub fn load_option_file(
        &self,
        expiry: &str,
        trade_date: &str,
    ) -> Result<(Vec<RawOptionRow>, MonthKey)> {
        let trade_day = parse_date_token("trade_date", trade_date)?;
        let month = MonthKey::from_date(trade_day);
        let path = self.layout.option_file(expiry, trade_date, trade_day);

        if !path.is_file() {
            return Err(MarketDataError::file_not_available(
                &path,
                format!(
                    "[FILE NOT FOUND] Option file not found:\n  \
                     Expiry    : {expiry}\n  \
                     TradeDate : {trade_date}\n  \
                     Expected  : {}\n\n  \
                     Possible causes:\n    \
                     1. This expiry was not traded on {trade_date}.\n       \
                     -> Use list_expiries('{trade_date}') to see what expiries are available.\n    \
                     2. The date format may be wrong.\n       \
                     -> Required format: DDMMMYY (e.g. '01FEB24').\n    \
                     3. Data for this period may not yet be loaded.\n       \
                     -> Contact the Data Pipeline Team.",
                    path.display()
                ),
            ));
        }

        let rows = load_option_rows(&path)?;
        Ok((rows, month))
    }

    /// Standardized option rows for one expiry and trade date, with spot
    /// price attached.
    ///
    /// An empty result is returned as an empty frame unless
    /// `filter.raise_if_empty` is set.
    pub fn query_options(
        &self,
        expiry: &str,
        trade_date: &str,
        filter: &QueryFilter,
    ) -> Result<OptionFrame> {
        let option_type = filter.parsed_option_type()?;

        let (raw, month) = self.load_option_file(expiry, trade_date)?;
        let mut rows = standardize(&raw, expiry, trade_date)?;

        if let Some(strikes) = &filter.strikes {
            let invalid: Vec<f64> = strikes.iter().copied().filter(|s| !s.is_finite()).collect();
            if !invalid.is_empty() {
                return Err(MarketDataError::InvalidParameter(format!(
                    "[PARAMETER ERROR] Non-numeric values in strikes list: {invalid:?}"
                )));
            }
            rows.retain(|r| strikes.iter().any(|s| *s == r.strike as f64));
        }

        if let Some(option_type) = option_type {
            rows.retain(|r| r.option_type == option_type);
        }

        if let Some(start) = &filter.start {
            let start = parse_time_bound("start", start)?;
            rows.retain(|r| r.timestamp >= start);
        }

        if let Some(end) = &filter.end {
            let end = parse_time_bound("end", end)?;
            rows.retain(|r| r.timestamp <= end);
        }

        if filter.min_volume > 0 {
            rows.retain(|r| r.volume >= filter.min_volume);
        }

        let spot = self.spot_cache.load(&self.layout, month)?;
        let rows = merge_spot(rows, &spot);

        if rows.is_empty() {
            let msg = format!(
                "[NO DATA] Query returned 0 rows.\n  \
                 Expiry: {expiry}  |  Trade Date: {trade_date}\n  \
                 Filters applied:\n{}\n\n  \
                 Suggestions:\n    \
                 -> Relax the min_volume filter (many rows have 0 volume).\n    \
                 -> Check available strikes: list_strikes('{expiry}', '{trade_date}')\n    \
                 -> Check trading hours: NIFTY trades 09:15-15:30 IST.",
                filter.describe()
            );
            if filter.raise_if_empty {
                return Err(MarketDataError::NoDataReturned(msg));
            }
            info!("{msg}");
        }

        Ok(OptionFrame::new(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_requires_existing_root() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = MarketDataEngine::new(&missing).unwrap_err();
        assert!(matches!(err, MarketDataError::FileNotAvailable { .. }));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_filter_builder() {
        let filter = QueryFilter::new()
            .strikes([21000, 21500])
            .option_type("C")
            .at("2024-01-01 10:00")
            .min_volume(10);
        assert_eq!(filter.strikes, Some(vec![21000.0, 21500.0]));
        assert_eq!(filter.start.as_deref(), Some("2024-01-01 10:00"));
        assert_eq!(filter.end.as_deref(), Some("2024-01-01 10:00"));
        assert_eq!(filter.min_volume, 10);
        assert!(!filter.raise_if_empty);
    }

    #[test]
    fn test_option_type_checked_before_io() {
        let dir = TempDir::new().unwrap();
        let engine = MarketDataEngine::new(dir.path()).unwrap();
        // The file does not exist, but option_type is validated first.
        let err = engine
            .query_options("01FEB24", "01JAN24", &QueryFilter::new().option_type("CE"))
            .unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidParameter(_)));
        assert!(err.to_string().contains("'CE'"));
    }

    #[test]
    fn test_missing_option_file_message() {
        let dir = TempDir::new().unwrap();
        let engine = MarketDataEngine::new(dir.path()).unwrap();
        let err = engine.load_option_file("01FEB24", "01JAN24").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("01FEB24"));
        assert!(msg.contains("01JAN24"));
        assert!(msg.contains("NIFTY-01FEB24-01JAN24.csv"));
        assert!(msg.contains("list_expiries"));
    }

    #[test]
    fn test_describe_lists_filters() {
        let text = QueryFilter::new().strikes([21000]).min_volume(5).describe();
        assert!(text.contains("strikes      = [21000.0]"));
        assert!(text.contains("option_type  = None"));
        assert!(text.contains("min_volume   = 5"));
    }
}
