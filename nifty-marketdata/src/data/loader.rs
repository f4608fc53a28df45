//! CSV loader for option chain and spot files.
//!
//! Files are read with polars, checked against the expected column set and
//! then converted into typed rows. Column names are case-sensitive.

use std::path::Path;

use polars::prelude::*;

use super::dates::{parse_datetime, MonthKey};
use super::types::{RawOptionRow, SpotPoint, SpotSeries};
use crate::error::{MarketDataError, Result};

/// Expected columns in option chain files.
pub const OPTION_COLUMNS: &[&str] = &[
    "datetime",
    "strike_price",
    "right",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "open_interest",
];

/// Expected columns in spot files.
pub const SPOT_COLUMNS: &[&str] = &["datetime", "close"];

/// Read a delimited file with a header row.
///
/// Column types are inferred from every row, so a decimal price appearing
/// after a run of whole numbers still loads.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Fail with a format error naming missing and found columns.
pub fn require_columns(df: &DataFrame, expected: &[&str], what: &str) -> Result<()> {
    let found: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let missing: Vec<&str> = expected
        .iter()
        .copied()
        .filter(|name| !found.iter().any(|f| f == name))
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    Err(MarketDataError::Format(format!(
        "[FORMAT ERROR] {what} does not contain expected columns {expected:?}.\n  \
         Missing columns: {missing:?}\n  \
         Found columns: {found:?}"
    )))
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let casted = df.column(name)?.cast(&DataType::String)?;
    Ok(casted
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let casted = df.column(name)?.cast(&DataType::Float64)?;
    Ok(casted.f64()?.into_iter().collect())
}

fn required<T>(value: Option<T>, what: &str, column: &str, row: usize) -> Result<T> {
    value.ok_or_else(|| {
        MarketDataError::Format(format!(
            "[FORMAT ERROR] {what}: column '{column}' has a missing or non-numeric value at row {row}."
        ))
    })
}

/// Load one option chain file into raw rows.
pub fn load_option_rows(path: &Path) -> Result<Vec<RawOptionRow>> {
    let df = read_csv(path)?;
    let what = format!("Option file {}", path.display());
    require_columns(&df, OPTION_COLUMNS, &what)?;

    let time = string_column(&df, "datetime")?;
    let strike = float_column(&df, "strike_price")?;
    let right = string_column(&df, "right")?;
    let open = float_column(&df, "open")?;
    let high = float_column(&df, "high")?;
    let low = float_column(&df, "low")?;
    let close = float_column(&df, "close")?;
    let volume = float_column(&df, "volume")?;
    let oi = float_column(&df, "open_interest")?;

    let mut rows = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        rows.push(RawOptionRow {
            time: required(time[idx].clone(), &what, "datetime", idx)?,
            strike_price: required(strike[idx], &what, "strike_price", idx)?,
            right: required(right[idx].clone(), &what, "right", idx)?,
            open: required(open[idx], &what, "open", idx)?,
            high: required(high[idx], &what, "high", idx)?,
            low: required(low[idx], &what, "low", idx)?,
            close: required(close[idx], &what, "close", idx)?,
            volume: required(volume[idx], &what, "volume", idx)?,
            open_interest: required(oi[idx], &what, "open_interest", idx)?,
        });
    }

    Ok(rows)
}

/// Load one month of spot prices, sorted by timestamp.
pub fn load_spot_series(path: &Path, month: MonthKey) -> Result<SpotSeries> {
    let df = read_csv(path)?;
    let what = format!("Spot file for '{month}'");
    require_columns(&df, SPOT_COLUMNS, &what)?;

    let stamps = string_column(&df, "datetime")?;
    let closes = float_column(&df, "close")?;

    let mut points = Vec::with_capacity(df.height());
    for (idx, (stamp, close)) in stamps.into_iter().zip(closes).enumerate() {
        let raw = required(stamp, &what, "datetime", idx)?;
        let timestamp = parse_datetime(&raw).ok_or_else(|| {
            MarketDataError::Format(format!(
                "[FORMAT ERROR] {what}: unparseable datetime '{raw}' at row {idx}.\n  \
                 Expected e.g. '2024-01-01 09:15:00'"
            ))
        })?;
        let spot_price = required(close, &what, "close", idx)?;
        points.push(SpotPoint {
            timestamp,
            spot_price,
        });
    }

    Ok(SpotSeries::new(month, points))
}
