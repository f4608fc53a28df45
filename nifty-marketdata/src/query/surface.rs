//! Composite queries built on [`MarketDataEngine::query_options`]:
//! ATM strike grids, multi-day stacking and volatility surface snapshots.
//!
//! The composite calls tolerate partial failure. A sub-query that hits a
//! missing file or returns no data is skipped; the call only fails when
//! nothing at all comes back.

use tracing::{debug, warn};

use super::engine::{MarketDataEngine, QueryFilter};
use crate::config::EngineConfig;
use crate::data::dates::{parse_date_token, parse_snapshot_time};
use crate::data::types::{AtmGrid, OptionRecord};
use crate::error::{MarketDataError, Result};
use crate::frame::OptionFrame;

/// Options for [`MarketDataEngine::query_time_series`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeriesRequest {
    pub strikes: Option<Vec<f64>>,
    pub option_type: Option<String>,
    /// `HH:MM`; when set, each day is narrowed to that single minute.
    pub snapshot_time: Option<String>,
    pub min_volume: u64,
}

/// Options for [`MarketDataEngine::surface_snapshot`].
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceRequest {
    pub n_expiries: usize,
    pub n_strikes: usize,
    pub step: i64,
    pub option_type: Option<String>,
    pub min_volume: u64,
}

impl Default for SurfaceRequest {
    fn default() -> Self {
        Self {
            n_expiries: 8,
            n_strikes: 10,
            step: 100,
            option_type: None,
            min_volume: 0,
        }
    }
}

impl SurfaceRequest {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            n_expiries: config.default_n_expiries,
            n_strikes: config.default_n_strikes,
            step: config.default_step,
            ..Self::default()
        }
    }
}

fn grid_overflow(what: &str) -> MarketDataError {
    MarketDataError::InvalidParameter(format!(
        "[PARAMETER ERROR] {what} does not fit in the strike range.\n  \
         Use a smaller n_strikes or step."
    ))
}

/// `round(spot / step) * step`, halves rounded away from zero.
pub fn atm_strike(spot: f64, step: i64) -> Result<i64> {
    if step <= 0 {
        return Err(MarketDataError::InvalidParameter(format!(
            "[PARAMETER ERROR] step must be a positive number of index points.\n  \
             Received: {step}"
        )));
    }
    if !spot.is_finite() {
        return Err(MarketDataError::InvalidParameter(format!(
            "[PARAMETER ERROR] spot price {spot} is not a finite number; cannot compute ATM."
        )));
    }

    let units = (spot / step as f64).round();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    if units < i64::MIN as f64 || units >= i64::MAX as f64 {
        return Err(grid_overflow("ATM strike"));
    }
    (units as i64)
        .checked_mul(step)
        .ok_or_else(|| grid_overflow("ATM strike"))
}

/// `atm + k * step` for `k` in `-n_strikes..=n_strikes`.
pub fn strike_grid(atm: i64, n_strikes: usize, step: i64) -> Result<Vec<i64>> {
    let n = i64::try_from(n_strikes).map_err(|_| grid_overflow("n_strikes"))?;
    let reach = n.checked_mul(step).ok_or_else(|| grid_overflow("strike grid"))?;
    atm.checked_sub(reach).ok_or_else(|| grid_overflow("strike grid"))?;
    atm.checked_add(reach).ok_or_else(|| grid_overflow("strike grid"))?;

    // Both ends fit, so every point between them does too.
    Ok((-n..=n).map(|k| atm + k * step).collect())
}

impl MarketDataEngine {
    /// ATM strike from the first row's spot price, plus a symmetric grid.
    pub fn get_atm_strikes(
        &self,
        expiry: &str,
        trade_date: &str,
        n_strikes: usize,
        step: i64,
    ) -> Result<AtmGrid> {
        if step <= 0 {
            return Err(MarketDataError::InvalidParameter(format!(
                "[PARAMETER ERROR] step must be a positive number of index points.\n  \
                 Received: {step}"
            )));
        }

        let frame = self.query_options(expiry, trade_date, &QueryFilter::default())?;
        let spot = frame.get(0).and_then(|r| r.spot_price).ok_or_else(|| {
            MarketDataError::NoDataReturned(format!(
                "[NO DATA] Cannot compute ATM for expiry '{expiry}' on '{trade_date}': \
                 no rows with a spot price.\n  \
                 Check the option file and the spot file for this month."
            ))
        })?;

        let atm = atm_strike(spot, step)?;
        Ok(AtmGrid {
            atm,
            strikes: strike_grid(atm, n_strikes, step)?,
        })
    }

    /// The same expiry across several trade dates, stacked in input order
    /// and tagged with `trade_date`.
    pub fn query_time_series(
        &self,
        expiry: &str,
        trade_dates: &[&str],
        request: &TimeSeriesRequest,
    ) -> Result<OptionFrame> {
        let snapshot = request
            .snapshot_time
            .as_deref()
            .map(parse_snapshot_time)
            .transpose()?;

        let mut stacked: Vec<OptionRecord> = Vec::new();
        let mut succeeded = 0usize;

        for &trade_date in trade_dates {
            let day = parse_date_token("trade_date", trade_date)?;

            let mut filter = QueryFilter {
                strikes: request.strikes.clone(),
                option_type: request.option_type.clone(),
                min_volume: request.min_volume,
                ..QueryFilter::default()
            };
            if let Some(time) = snapshot {
                filter = filter.at(day.and_time(time).format("%Y-%m-%d %H:%M:%S").to_string());
            }

            match self.query_options(expiry, trade_date, &filter) {
                Ok(frame) => {
                    succeeded += 1;
                    stacked.extend(frame.into_iter().map(|mut row| {
                        row.trade_date = Some(trade_date.to_string());
                        row
                    }));
                }
                Err(e) if e.is_recoverable() => {
                    warn!("[SKIP] trade_date='{trade_date}': {}", e.headline());
                }
                Err(e) => return Err(e),
            }
        }

        if succeeded == 0 {
            return Err(MarketDataError::NoDataReturned(
                "[NO DATA] query_time_series returned no data across all trade dates.\n  \
                 Check that the expiry and trade_dates are correct."
                    .to_string(),
            ));
        }

        Ok(OptionFrame::new(stacked))
    }

    /// Volatility surface input at one instant: an ATM-centred strike grid
    /// for each of the first `n_expiries` expiries listed for `trade_date`.
    ///
    /// Rows are sorted by expiry, strike, then option type.
    pub fn surface_snapshot(
        &self,
        trade_date: &str,
        timestamp: &str,
        request: &SurfaceRequest,
    ) -> Result<OptionFrame> {
        let expiries = self.list_expiries(trade_date)?;
        if expiries.is_empty() {
            return Err(MarketDataError::NoDataReturned(format!(
                "[NO DATA] No expiries found for trade_date='{trade_date}'.\n  \
                 Use list_expiries('{trade_date}') to debug."
            )));
        }

        let mut rows: Vec<OptionRecord> = Vec::new();
        for expiry in expiries.iter().take(request.n_expiries) {
            match self.surface_slice(expiry, trade_date, timestamp, request) {
                Ok(frame) => rows.extend(frame),
                Err(e) if e.is_recoverable() => {
                    debug!(expiry = %expiry, "surface slice skipped: {}", e.headline());
                }
                Err(e) => return Err(e),
            }
        }

        if rows.is_empty() {
            return Err(MarketDataError::NoDataReturned(format!(
                "[NO DATA] surface_snapshot returned no data.\n  \
                 trade_date='{trade_date}', timestamp='{timestamp}'\n  \
                 Try a different timestamp or reduce min_volume."
            )));
        }

        rows.sort_by(|a, b| {
            (a.expiry_date, a.strike, a.option_type).cmp(&(b.expiry_date, b.strike, b.option_type))
        });
        Ok(OptionFrame::new(rows))
    }

    fn surface_slice(
        &self,
        expiry: &str,
        trade_date: &str,
        timestamp: &str,
        request: &SurfaceRequest,
    ) -> Result<OptionFrame> {
        let grid = self.get_atm_strikes(expiry, trade_date, request.n_strikes, request.step)?;
        let filter = QueryFilter {
            strikes: Some(grid.strikes.iter().map(|s| *s as f64).collect()),
            option_type: request.option_type.clone(),
            min_volume: request.min_volume,
            ..QueryFilter::default()
        }
        .at(timestamp);
        self.query_options(expiry, trade_date, &filter)
    }
}
