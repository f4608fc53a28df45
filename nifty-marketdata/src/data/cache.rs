//! Per-month spot price cache.
//!
//! Each engine owns one cache. Entries are loaded on first use and kept until
//! [`SpotCache::clear`] is called; there is no eviction.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use super::dates::MonthKey;
use super::loader::load_spot_series;
use super::paths::DataLayout;
use super::types::SpotSeries;
use crate::error::{MarketDataError, Result};

#[derive(Debug, Default)]
pub struct SpotCache {
    entries: RwLock<HashMap<MonthKey, Arc<SpotSeries>>>,
}

impl SpotCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<MonthKey, Arc<SpotSeries>>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<MonthKey, Arc<SpotSeries>>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Return the month's series, loading it from disk on a miss.
    pub fn load(&self, layout: &DataLayout, month: MonthKey) -> Result<Arc<SpotSeries>> {
        if let Some(series) = self.read().get(&month) {
            debug!(month = %month, rows = series.len(), "spot cache hit");
            return Ok(Arc::clone(series));
        }

        let path = layout.spot_file(month);
        if !path.is_file() {
            return Err(MarketDataError::file_not_available(
                &path,
                format!(
                    "[FILE NOT FOUND] Spot file is missing for month '{month}'.\n  \
                     Expected path: {}\n  \
                     Please contact the Data Pipeline Team if this month's data \
                     should be available.",
                    path.display()
                ),
            ));
        }

        let series = Arc::new(load_spot_series(&path, month)?);
        debug!(month = %month, rows = series.len(), path = %path.display(), "loaded spot month");

        self.write().insert(month, Arc::clone(&series));
        Ok(series)
    }

    /// Drop every cached month, returning how many were removed.
    pub fn clear(&self) -> usize {
        let mut entries = self.write();
        let removed = entries.len();
        entries.clear();
        info!("[CACHE] Spot cache cleared. ({removed} month(s) removed)");
        removed
    }

    /// Month key to row count for every cached month.
    pub fn status(&self) -> BTreeMap<String, usize> {
        self.read()
            .iter()
            .map(|(month, series)| (month.to_string(), series.len()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
