//! Daily soil water balance for irrigated crops, after FAO-56.
//!
//! Two composable stages over one [`DailySeries`] table:
//!
//! - [`KcSchedule::apply`] expands a growth-stage schedule into a daily crop
//!   coefficient and derives crop evapotranspiration;
//! - [`WaterBalance::run`] propagates root zone depletion day by day,
//!   producing depletion, moisture, water stress, and irrigation columns.
//!
//! [`effective_precipitation`] and [`RunConfig`] cover input preparation and
//! TOML configuration around the two stages.

mod balance;
mod config;
mod error;
mod kc;
mod precipitation;
mod series;

pub use balance::{BalanceParameters, BalanceSummary, DayState, Irrigation, WaterBalance};
pub use config::RunConfig;
pub use error::{SwbError, SwbResult};
pub use kc::{GrowthStage, KcSchedule};
pub use precipitation::effective_precipitation;
pub use series::{DailySeries, column};
