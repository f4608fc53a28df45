//! Raw option rows to the standardized schema.

use crate::data::dates::{parse_date_token, parse_intraday_time};
use crate::data::types::{OptionRecord, OptionType, RawOptionRow};
use crate::error::{MarketDataError, Result};

/// Convert raw rows from one chain file into [`OptionRecord`]s.
///
/// Output keeps input order. `spot_price` and `trade_date` are left unset.
pub fn standardize(
    raw: &[RawOptionRow],
    expiry: &str,
    trade_date: &str,
) -> Result<Vec<OptionRecord>> {
    let expiry_date = parse_date_token("expiry", expiry)?;
    let trade_day = parse_date_token("trade_date", trade_date)?;
    let days_to_expiry = (expiry_date - trade_day).num_days();

    raw.iter()
        .enumerate()
        .map(|(idx, row)| {
            let time = parse_intraday_time(&row.time).ok_or_else(|| {
                MarketDataError::Format(format!(
                    "[FORMAT ERROR] Row {idx} of NIFTY-{expiry}-{trade_date}: \
                     intraday time '{}' is not HH:MM[:SS].",
                    row.time
                ))
            })?;

            let option_type = OptionType::from_right_code(&row.right).ok_or_else(|| {
                MarketDataError::InvalidParameter(format!(
                    "[PARAMETER ERROR] Unrecognised option right '{}' in row {idx} of \
                     NIFTY-{expiry}-{trade_date}.\n  Expected 'CE' (Call) or 'PE' (Put).",
                    row.right
                ))
            })?;

            Ok(OptionRecord {
                trade_date: None,
                timestamp: trade_day.and_time(time),
                expiry_date,
                days_to_expiry,
                strike: row.strike_price.trunc() as i64,
                option_type,
                open_price: row.open,
                high_price: row.high,
                low_price: row.low,
                close_price: row.close,
                market_price: row.close,
                volume: count(row.volume, "volume", idx)?,
                open_interest: count(row.open_interest, "open_interest", idx)?,
                spot_price: None,
            })
        })
        .collect()
}

/// Whole-number count; fractional values are truncated toward zero.
fn count(value: f64, column: &str, idx: usize) -> Result<u64> {
    if !value.is_finite() || value < 0.0 {
        return Err(MarketDataError::Format(format!(
            "[FORMAT ERROR] Column '{column}' must be a non-negative count; \
             found {value} at row {idx}."
        )));
    }
    Ok(value.trunc() as u64)
}
