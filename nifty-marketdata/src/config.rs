//! Engine configuration, loadable from TOML.
//!
//! ```toml
//! data_dir = "/mnt/shared/NiftyHistorical"
//! default_step = 100
//! default_n_strikes = 10
//! default_n_expiries = 8
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MarketDataError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Root folder holding one sub-folder per year.
    pub data_dir: PathBuf,

    /// Strike spacing in index points.
    #[serde(default = "default_step")]
    pub default_step: i64,

    /// Strikes each side of ATM.
    #[serde(default = "default_n_strikes")]
    pub default_n_strikes: usize,

    /// Expiries included in a surface snapshot.
    #[serde(default = "default_n_expiries")]
    pub default_n_expiries: usize,
}

fn default_step() -> i64 {
    100
}

fn default_n_strikes() -> usize {
    10
}

fn default_n_expiries() -> usize {
    8
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/nifty"),
            default_step: default_step(),
            default_n_strikes: default_n_strikes(),
            default_n_expiries: default_n_expiries(),
        }
    }
}

impl EngineConfig {
    /// Load config from a TOML file.
    pub fn from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            MarketDataError::Format(msg) => {
                MarketDataError::Format(format!("{msg}\n  File: {}", path.display()))
            }
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            MarketDataError::Format(format!("[CONFIG ERROR] Invalid engine config: {e}"))
        })?;
        if config.default_step <= 0 {
            return Err(MarketDataError::InvalidParameter(format!(
                "[CONFIG ERROR] default_step must be positive, got {}",
                config.default_step
            )));
        }
        Ok(config)
    }
}
