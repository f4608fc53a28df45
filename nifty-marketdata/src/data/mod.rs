pub mod cache;
pub mod dates;
pub mod loader;
pub mod paths;
pub mod types;

pub use cache::SpotCache;
pub use dates::{format_date_token, parse_date_token, MonthKey};
pub use loader::{load_option_rows, load_spot_series, OPTION_COLUMNS, SPOT_COLUMNS};
pub use paths::{parse_option_file_name, DataLayout, OptionFileName};
pub use types::{AtmGrid, OptionRecord, OptionType, RawOptionRow, SpotPoint, SpotSeries};
