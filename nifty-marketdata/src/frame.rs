//! Tabular query results.
//!
//! Queries return an [`OptionFrame`]: an ordered set of standardized rows
//! that can be exported as a polars `DataFrame` or written out as CSV.

use std::io::Write;

use polars::prelude::*;
use serde::Serialize;

use crate::data::types::{OptionRecord, SpotSeries};
use crate::error::Result;

/// Standardized option rows, positioned `0..len`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OptionFrame {
    rows: Vec<OptionRecord>,
}

impl OptionFrame {
    pub fn new(rows: Vec<OptionRecord>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[OptionRecord] {
        &self.rows
    }

    pub fn get(&self, idx: usize) -> Option<&OptionRecord> {
        self.rows.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OptionRecord> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<OptionRecord> {
        self.rows
    }

    /// Distinct strikes, ascending.
    pub fn strikes(&self) -> Vec<i64> {
        let mut strikes: Vec<i64> = self.rows.iter().map(|r| r.strike).collect();
        strikes.sort_unstable();
        strikes.dedup();
        strikes
    }

    /// Export as a polars `DataFrame` in the standardized column order.
    ///
    /// A leading `trade_date` column is present only when rows carry one.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let rows = &self.rows;
        let mut df = df!(
            "timestamp" => rows.iter().map(|r| r.timestamp).collect::<Vec<_>>(),
            "expiry_date" => rows.iter().map(|r| r.expiry_date).collect::<Vec<_>>(),
            "days_to_expiry" => rows.iter().map(|r| r.days_to_expiry).collect::<Vec<_>>(),
            "strike" => rows.iter().map(|r| r.strike).collect::<Vec<_>>(),
            "option_type" => rows.iter().map(|r| r.option_type.as_str()).collect::<Vec<_>>(),
            "open_price" => rows.iter().map(|r| r.open_price).collect::<Vec<_>>(),
            "high_price" => rows.iter().map(|r| r.high_price).collect::<Vec<_>>(),
            "low_price" => rows.iter().map(|r| r.low_price).collect::<Vec<_>>(),
            "close_price" => rows.iter().map(|r| r.close_price).collect::<Vec<_>>(),
            "market_price" => rows.iter().map(|r| r.market_price).collect::<Vec<_>>(),
            "volume" => rows.iter().map(|r| r.volume).collect::<Vec<_>>(),
            "open_interest" => rows.iter().map(|r| r.open_interest).collect::<Vec<_>>(),
            "spot_price" => rows.iter().map(|r| r.spot_price).collect::<Vec<_>>()
        )?;

        if rows.iter().any(|r| r.trade_date.is_some()) {
            let trade_dates: Vec<Option<&str>> =
                rows.iter().map(|r| r.trade_date.as_deref()).collect();
            df.insert_column(0, Column::new("trade_date".into(), trade_dates))?;
        }

        Ok(df)
    }

    /// Write the frame as CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut df = self.to_dataframe()?;
        CsvWriter::new(writer).include_header(true).finish(&mut df)?;
        Ok(())
    }
}

impl IntoIterator for OptionFrame {
    type Item = OptionRecord;
    type IntoIter = std::vec::IntoIter<OptionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a OptionFrame {
    type Item = &'a OptionRecord;
    type IntoIter = std::slice::Iter<'a, OptionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl SpotSeries {
    /// Export as a `(timestamp, spot_price)` `DataFrame`.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let points = self.points();
        let df = df!(
            "timestamp" => points.iter().map(|p| p.timestamp).collect::<Vec<_>>(),
            "spot_price" => points.iter().map(|p| p.spot_price).collect::<Vec<_>>()
        )?;
        Ok(df)
    }
}
