//! Crop coefficient curve and crop evapotranspiration.
//!
//! Expands an FAO-56 growth-stage schedule into a daily Kc series and derives
//! ETc = ETo * Kc. Days before planting (and past the end of the schedule)
//! keep the off-season coefficient.

use chrono::{NaiveDate, NaiveTime};
use nalgebra::DVector;
use serde::Deserialize;
use tracing::debug;

use crate::error::{SwbError, SwbResult};
use crate::series::{DailySeries, column};

/// One growth stage: how long it lasts and the Kc it ends at.
///
/// The starting coefficient is implicit: the previous stage's `kc_end`, or
/// the schedule's `kc_at_planting` for the first stage.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GrowthStage {
    /// Stage length [days]. Must be at least one.
    pub duration_days: u32,
    /// Crop coefficient on the stage's last day [-].
    pub kc_end: f64,
}

impl GrowthStage {
    /// Creates a stage, rejecting zero durations.
    pub fn new(duration_days: u32, kc_end: f64) -> SwbResult<Self> {
        if duration_days == 0 {
            return Err(SwbError::InvalidParameters {
                reason: "stage duration must be at least one day".to_string(),
            });
        }
        Ok(Self {
            duration_days,
            kc_end,
        })
    }
}

/// Growth-stage schedule anchored at a planting date.
#[derive(Debug, Clone, Deserialize)]
pub struct KcSchedule {
    /// Calendar date of planting.
    pub planting_date: NaiveDate,
    /// Kc for days strictly before planting and past the schedule [-].
    pub kc_offseason: f64,
    /// Starting coefficient of the first stage [-].
    pub kc_at_planting: f64,
    /// Stages in growth order.
    pub stages: Vec<GrowthStage>,
}

impl KcSchedule {
    /// Checks every stage lasts at least one day.
    pub fn validate(&self) -> SwbResult<()> {
        for (index, stage) in self.stages.iter().enumerate() {
            if stage.duration_days == 0 {
                return Err(SwbError::ZeroDurationStage { index });
            }
        }
        Ok(())
    }

    /// Appends `kc` and `crop_evapotranspiration` columns to the series.
    ///
    /// The planting date is combined with the time-of-day of the series'
    /// first timestamp (midnight when the series is empty), so the stage
    /// windows line up whether or not the index carries a time component.
    /// Stage days falling outside the series are clipped, never an error.
    ///
    /// # Errors
    ///
    /// Returns [`SwbError::ZeroDurationStage`] for an invalid schedule and
    /// [`SwbError::MissingColumn`] when the series has no reference
    /// evapotranspiration; the series is untouched in both cases.
    pub fn apply(&self, series: &mut DailySeries) -> SwbResult<()> {
        self.validate()?;

        let n = series.len();
        let mut kc = DVector::from_element(n, self.kc_offseason);

        // Planting is compared at the index's own time-of-day, so stage
        // windows line up for midnight and non-midnight timestamps alike.
        let clock = series
            .first_timestamp()
            .map(|ts| ts.time())
            .unwrap_or(NaiveTime::MIN);
        let planting = self.planting_date.and_time(clock);

        // Row offset of the planting day; negative when planting precedes
        // the series, None when the series is empty.
        if let Some(base) = series.day_offset(planting) {
            let mut days_done: i64 = 0;
            let mut kc_start = self.kc_at_planting;
            for stage in &self.stages {
                let d = i64::from(stage.duration_days);
                // Samples 1..=d of the (d+1)-point linear ramp; sample 0
                // belongs to the previous day.
                for k in 1..=d {
                    let row = base + days_done + k - 1;
                    if row < 0 {
                        continue;
                    }
                    if row >= n as i64 {
                        break;
                    }
                    let frac = k as f64 / d as f64;
                    kc[row as usize] = kc_start + (stage.kc_end - kc_start) * frac;
                }
                days_done += d;
                kc_start = stage.kc_end;
            }
        }

        let etc = series
            .column(column::REF_EVAPOTRANSPIRATION)?
            .component_mul(&kc);
        series.insert(column::KC, kc)?;
        series.insert(column::CROP_EVAPOTRANSPIRATION, etc)?;
        debug!(
            stages = self.stages.len(),
            n_days = n,
            "expanded crop coefficient curve"
        );
        Ok(())
    }
}
