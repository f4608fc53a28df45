//! Core data types for the NIFTY options dataset.
//!
//! Raw rows mirror the CSV files verbatim. [`OptionRecord`] is the
//! standardized unit every query works on.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::dates::MonthKey;

/// Option type (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionType {
    #[serde(rename = "C")]
    Call,
    #[serde(rename = "P")]
    Put,
}

impl OptionType {
    /// Parse a canonical query code, `"C"` or `"P"`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "C" => Some(Self::Call),
            "P" => Some(Self::Put),
            _ => None,
        }
    }

    /// Map the exchange right code found in option files.
    pub fn from_right_code(code: &str) -> Option<Self> {
        match code.trim() {
            "CE" => Some(Self::Call),
            "PE" => Some(Self::Put),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "C",
            Self::Put => "P",
        }
    }
}

/// One spot observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotPoint {
    pub timestamp: NaiveDateTime,
    pub spot_price: f64,
}

/// Spot prices for one month, sorted ascending by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotSeries {
    month: MonthKey,
    points: Vec<SpotPoint>,
}

impl SpotSeries {
    /// Build a series, sorting points by timestamp (stable).
    pub fn new(month: MonthKey, mut points: Vec<SpotPoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        Self { month, points }
    }

    pub fn month(&self) -> MonthKey {
        self.month
    }

    pub fn points(&self) -> &[SpotPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One option row exactly as read from a chain file.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOptionRow {
    /// Intraday `datetime` field, time of day only.
    pub time: String,
    pub strike_price: f64,
    /// Exchange right code, `CE` or `PE`.
    pub right: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub open_interest: f64,
}

/// A standardized option observation.
///
/// There is no bid/ask in the dataset, so `market_price` is always the close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionRecord {
    /// Trade date token, set when rows from several days are stacked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_date: Option<String>,

    /// Trade date plus intraday time
    pub timestamp: NaiveDateTime,

    /// Expiry as a plain calendar date
    pub expiry_date: NaiveDate,

    /// Calendar days from trade date to expiry
    pub days_to_expiry: i64,

    pub strike: i64,

    pub option_type: OptionType,

    pub open_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub close_price: f64,

    /// Pricing proxy, equal to `close_price`
    pub market_price: f64,

    pub volume: u64,

    pub open_interest: u64,

    /// Nearest spot price, attached by the spot merge
    pub spot_price: Option<f64>,
}

/// ATM strike and the symmetric grid around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtmGrid {
    pub atm: i64,
    /// Ascending, `2 * n_strikes + 1` entries
    pub strikes: Vec<i64>,
}
