//! NIFTY historical market data CLI.
//!
//! # Usage
//!
//! ```bash
//! # Full chain for one expiry and trade date, as CSV
//! nifty-md --data-dir /mnt/NiftyHistorical query 01FEB24 01JAN24
//!
//! # Liquid ATM calls between 10:00 and 11:00
//! nifty-md query 01FEB24 01JAN24 --strikes 21600,21700 --option-type C \
//!     --start "2024-01-01 10:00" --end "2024-01-01 11:00" --min-volume 10
//!
//! # Discovery
//! nifty-md expiries 01JAN24
//! nifty-md days 2024 JAN
//!
//! # Volatility surface input at 10:00
//! nifty-md surface 01JAN24 "2024-01-01 10:00" --option-type C
//! ```

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use nifty_marketdata::{
    EngineConfig, MarketDataEngine, OptionFrame, QueryFilter, SurfaceRequest, TimeSeriesRequest,
};

#[derive(Parser)]
#[command(name = "nifty-md")]
#[command(about = "Query historical NIFTY option chain and spot data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Dataset root (overrides the config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Standardized option rows for one expiry and trade date
    Query {
        /// Expiry (DDMMMYY)
        expiry: String,

        /// Trade date (DDMMMYY)
        trade_date: String,

        /// Comma-separated strikes
        #[arg(long, value_delimiter = ',')]
        strikes: Option<Vec<f64>>,

        /// C or P
        #[arg(long)]
        option_type: Option<String>,

        /// Inclusive start, YYYY-MM-DD HH:MM
        #[arg(long)]
        start: Option<String>,

        /// Inclusive end, YYYY-MM-DD HH:MM
        #[arg(long)]
        end: Option<String>,

        #[arg(long, default_value_t = 0)]
        min_volume: u64,

        /// Fail instead of printing an empty table
        #[arg(long)]
        strict: bool,
    },

    /// Expiries available on a trade date
    Expiries { trade_date: String },

    /// Strikes in one chain file
    Strikes { expiry: String, trade_date: String },

    /// Trade dates with data in a month
    Days {
        year: i32,
        /// Three-letter month, e.g. JAN
        month: String,
    },

    /// ATM strike and symmetric grid
    Atm {
        expiry: String,
        trade_date: String,

        #[arg(long)]
        n_strikes: Option<usize>,

        #[arg(long)]
        step: Option<i64>,
    },

    /// One expiry across several trade dates
    TimeSeries {
        expiry: String,

        /// Comma-separated trade dates
        #[arg(value_delimiter = ',')]
        trade_dates: Vec<String>,

        #[arg(long, value_delimiter = ',')]
        strikes: Option<Vec<f64>>,

        #[arg(long)]
        option_type: Option<String>,

        /// HH:MM snapshot minute
        #[arg(long)]
        snapshot_time: Option<String>,

        #[arg(long, default_value_t = 0)]
        min_volume: u64,
    },

    /// Volatility surface input grid at one timestamp
    Surface {
        trade_date: String,

        /// YYYY-MM-DD HH:MM
        timestamp: String,

        #[arg(long)]
        n_expiries: Option<usize>,

        #[arg(long)]
        n_strikes: Option<usize>,

        #[arg(long)]
        step: Option<i64>,

        #[arg(long)]
        option_type: Option<String>,

        #[arg(long, default_value_t = 0)]
        min_volume: u64,
    },

    /// Load spot months and print the cache status
    Spot {
        /// Month keys, e.g. 2024JAN
        months: Vec<String>,
    },
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_toml(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

fn print_frame(frame: &OptionFrame) -> Result<()> {
    frame
        .write_csv(io::stdout().lock())
        .context("Failed to write CSV to stdout")
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nifty_marketdata=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let engine = MarketDataEngine::new(&config.data_dir)?;

    match cli.command {
        Commands::Query {
            expiry,
            trade_date,
            strikes,
            option_type,
            start,
            end,
            min_volume,
            strict,
        } => {
            let filter = QueryFilter {
                strikes,
                option_type,
                start,
                end,
                min_volume,
                raise_if_empty: strict,
            };
            let frame = engine.query_options(&expiry, &trade_date, &filter)?;
            print_frame(&frame)?;
        }
        Commands::Expiries { trade_date } => {
            for expiry in engine.list_expiries(&trade_date)? {
                println!("{expiry}");
            }
        }
        Commands::Strikes { expiry, trade_date } => {
            for strike in engine.list_strikes(&expiry, &trade_date)? {
                println!("{strike}");
            }
        }
        Commands::Days { year, month } => {
            for day in engine.list_trading_days(year, &month)? {
                println!("{day}");
            }
        }
        Commands::Atm {
            expiry,
            trade_date,
            n_strikes,
            step,
        } => {
            let grid = engine.get_atm_strikes(
                &expiry,
                &trade_date,
                n_strikes.unwrap_or(config.default_n_strikes),
                step.unwrap_or(config.default_step),
            )?;
            println!("{}", serde_json::to_string_pretty(&grid)?);
        }
        Commands::TimeSeries {
            expiry,
            trade_dates,
            strikes,
            option_type,
            snapshot_time,
            min_volume,
        } => {
            let request = TimeSeriesRequest {
                strikes,
                option_type,
                snapshot_time,
                min_volume,
            };
            let dates: Vec<&str> = trade_dates.iter().map(String::as_str).collect();
            let frame = engine.query_time_series(&expiry, &dates, &request)?;
            print_frame(&frame)?;
        }
        Commands::Surface {
            trade_date,
            timestamp,
            n_expiries,
            n_strikes,
            step,
            option_type,
            min_volume,
        } => {
            let defaults = SurfaceRequest::from_config(&config);
            let request = SurfaceRequest {
                n_expiries: n_expiries.unwrap_or(defaults.n_expiries),
                n_strikes: n_strikes.unwrap_or(defaults.n_strikes),
                step: step.unwrap_or(defaults.step),
                option_type,
                min_volume,
            };
            let frame = engine.surface_snapshot(&trade_date, &timestamp, &request)?;
            print_frame(&frame)?;
        }
        Commands::Spot { months } => {
            for month in &months {
                engine
                    .load_spot_month(month)
                    .with_context(|| format!("Failed to load spot month {month}"))?;
            }
            println!("{}", serde_json::to_string_pretty(&engine.cache_status())?);
        }
    }

    Ok(())
}
