pub mod discovery;
pub mod engine;
pub mod merge;
pub mod standardize;
pub mod surface;

pub use engine::{MarketDataEngine, QueryFilter};
pub use merge::merge_spot;
pub use standardize::standardize;
pub use surface::{atm_strike, strike_grid, SurfaceRequest, TimeSeriesRequest};
