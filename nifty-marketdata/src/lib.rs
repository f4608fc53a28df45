//! Query layer over historical NIFTY option chain and spot CSV files.
//!
//! ```no_run
//! use nifty_marketdata::{MarketDataEngine, QueryFilter};
//!
//! let md = MarketDataEngine::new("/mnt/shared/NiftyHistorical")?;
//! let calls = md.query_options(
//!     "01FEB24",
//!     "01JAN24",
//!     &QueryFilter::new().option_type("C").min_volume(10),
//! )?;
//! println!("{} rows", calls.len());
//! # Ok::<(), nifty_marketdata::MarketDataError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod frame;
pub mod query;

// Re-export commonly used types
pub use config::EngineConfig;
pub use data::{AtmGrid, MonthKey, OptionRecord, OptionType, SpotPoint, SpotSeries};
pub use error::{MarketDataError, Result};
pub use frame::OptionFrame;
pub use query::{MarketDataEngine, QueryFilter, SurfaceRequest, TimeSeriesRequest};
