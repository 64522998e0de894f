//! TOML run configuration.
//!
//! A run is described by a `[balance]` table of soil and crop constants and
//! a `[crop]` table with the planting date and growth-stage schedule:
//!
//! ```toml
//! [balance]
//! theta_s = 0.425
//! theta_fc = 0.287
//! theta_wp = 0.14
//! zr = 0.5
//! zr_factor = 1000.0
//! p = 0.5
//! draintime = 16.2
//! theta_init = 0.2
//! refill_factor = 1.0
//!
//! [crop]
//! planting_date = "1974-05-23"
//! kc_offseason = 0.1
//! kc_at_planting = 0.15
//! stages = [
//!     { duration_days = 25, kc_end = 0.15 },
//!     { duration_days = 25, kc_end = 1.19 },
//!     { duration_days = 30, kc_end = 1.19 },
//!     { duration_days = 20, kc_end = 0.35 },
//! ]
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::balance::BalanceParameters;
use crate::error::{SwbError, SwbResult};
use crate::kc::KcSchedule;

/// Validated configuration for one soil-water-balance run.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Soil and crop constants for the balance engine.
    pub balance: BalanceParameters,
    /// Planting date and growth-stage schedule for the Kc curve.
    pub crop: KcSchedule,
}

impl RunConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`SwbError::InvalidConfig`] on malformed TOML, and the
    /// parameter or stage error when a value is out of range; no
    /// partially-valid configuration is returned.
    pub fn from_toml_str(text: &str) -> SwbResult<Self> {
        let config: RunConfig = toml::from_str(text).map_err(|e| SwbError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// As [`from_toml_str`](Self::from_toml_str), plus
    /// [`SwbError::InvalidConfig`] when the file cannot be read.
    pub fn from_toml_file(path: impl AsRef<Path>) -> SwbResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| SwbError::InvalidConfig {
            reason: format!("{}: {}", path.display(), e),
        })?;
        debug!(path = %path.display(), "loaded run configuration");
        Self::from_toml_str(&text)
    }

    /// Checks parameter ranges and the stage schedule.
    pub fn validate(&self) -> SwbResult<()> {
        self.balance.validate()?;
        self.crop.validate()
    }
}
