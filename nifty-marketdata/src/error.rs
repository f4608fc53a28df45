//! Error taxonomy for the market data engine.
//!
//! Every failure surfaced by the crate is a [`MarketDataError`]. Messages are
//! written to be read by a person at a terminal: they say what was expected,
//! what was found, and what to try next.

use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketDataError {
    /// A file or folder is missing from its conventional location.
    #[error("{message}")]
    FileNotAvailable { message: String, path: PathBuf },

    /// A caller-supplied argument is malformed.
    #[error("{0}")]
    InvalidParameter(String),

    /// A query produced zero rows and the caller required data.
    #[error("{0}")]
    NoDataReturned(String),

    /// A file on disk does not have the expected layout.
    #[error("{0}")]
    Format(String),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MarketDataError {
    pub(crate) fn file_not_available(path: impl Into<PathBuf>, message: String) -> Self {
        Self::FileNotAvailable {
            message,
            path: path.into(),
        }
    }

    /// Whether a composite query may skip this failure and keep going.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::FileNotAvailable { .. } | Self::NoDataReturned(_))
    }

    /// First line of the message, used for one-line skip notices.
    pub fn headline(&self) -> String {
        self.to_string().lines().next().unwrap_or_default().to_string()
    }
}

pub type Result<T> = std::result::Result<T, MarketDataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_kinds() {
        let missing = MarketDataError::file_not_available("/tmp/x.csv", "missing".into());
        assert!(missing.is_recoverable());
        assert!(MarketDataError::NoDataReturned("empty".into()).is_recoverable());
        assert!(!MarketDataError::InvalidParameter("bad".into()).is_recoverable());
        assert!(!MarketDataError::Format("cols".into()).is_recoverable());
    }

    #[test]
    fn test_headline_is_first_line() {
        let err = MarketDataError::NoDataReturned("[NO DATA] first\n  second".into());
        assert_eq!(err.headline(), "[NO DATA] first");
    }
}
