//! Daily time series table keyed by timestamp.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, TimeDelta};
use nalgebra::DVector;

use crate::error::{SwbError, SwbResult};

/// Well-known column names shared by the crop-coefficient and balance stages.
pub mod column {
    /// Reference evapotranspiration ETo [mm/day].
    pub const REF_EVAPOTRANSPIRATION: &str = "ref_evapotranspiration";
    /// Raw precipitation [mm/day].
    pub const PRECIPITATION: &str = "precipitation";
    /// Precipitation that reaches the root zone [mm/day].
    pub const EFFECTIVE_PRECIPITATION: &str = "effective_precipitation";
    /// Crop coefficient [-].
    pub const KC: &str = "kc";
    /// Crop evapotranspiration ETc = ETo * Kc [mm/day].
    pub const CROP_EVAPOTRANSPIRATION: &str = "crop_evapotranspiration";
    /// Per-day irrigation input, amount or policy.
    pub const ACTUAL_NET_IRRIGATION: &str = "actual_net_irrigation";
    /// Root zone depletion [mm].
    pub const DR: &str = "dr";
    /// Root zone soil moisture [-].
    pub const THETA: &str = "theta";
    /// Water stress coefficient [-].
    pub const KS: &str = "ks";
    /// Irrigation the model advises for the day [mm].
    pub const RECOMMENDED_NET_IRRIGATION: &str = "recommended_net_irrigation";
    /// Irrigation the balance actually charges for the day [mm].
    pub const ASSUMED_NET_IRRIGATION: &str = "assumed_net_irrigation";
}

/// Tabular daily series: one strictly increasing, gapless timestamp index
/// shared by every named column.
///
/// All inputs and outputs of a run live in the same table, so the columns of
/// one run can never disagree on their keys; the remaining shape errors are
/// a missing column, a length mismatch on insert, and a non-daily index, all
/// raised before anything is stored.
#[derive(Debug, Clone, Default)]
pub struct DailySeries {
    timestamps: Vec<NaiveDateTime>,
    columns: BTreeMap<String, DVector<f64>>,
}

impl DailySeries {
    /// Creates a series with no rows and no columns.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a series from an explicit timestamp index.
    ///
    /// # Errors
    ///
    /// Returns [`SwbError::NonDailyIndex`] unless every step between
    /// consecutive timestamps is exactly one day.
    pub fn with_index(timestamps: Vec<NaiveDateTime>) -> SwbResult<Self> {
        for (i, pair) in timestamps.windows(2).enumerate() {
            if pair[1] - pair[0] != TimeDelta::days(1) {
                return Err(SwbError::NonDailyIndex { position: i + 1 });
            }
        }
        Ok(Self {
            timestamps,
            columns: BTreeMap::new(),
        })
    }

    /// Creates a gapless daily index of `n_days` rows starting at `start`.
    pub fn daily(start: NaiveDateTime, n_days: usize) -> Self {
        let timestamps = (0..n_days)
            .map(|i| start + TimeDelta::days(i as i64))
            .collect();
        Self {
            timestamps,
            columns: BTreeMap::new(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the series has no rows.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// The timestamp index.
    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// First timestamp, if any.
    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamps.first().copied()
    }

    /// Signed whole-day offset of `ts` from the first timestamp.
    ///
    /// Well defined because the index is gapless: row `i` sits at offset
    /// `i`. Offsets outside `0..len` denote days before or after the series.
    /// Returns `None` on an empty series.
    pub fn day_offset(&self, ts: NaiveDateTime) -> Option<i64> {
        self.timestamps.first().map(|first| (ts - *first).num_days())
    }

    /// Whether a column named `name` exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Inserts or replaces a column.
    ///
    /// # Errors
    ///
    /// Returns [`SwbError::LengthMismatch`] if `values` does not match the
    /// series length; nothing is stored in that case.
    pub fn insert(&mut self, name: &str, values: DVector<f64>) -> SwbResult<()> {
        if values.len() != self.len() {
            return Err(SwbError::LengthMismatch {
                name: name.to_string(),
                expected: self.len(),
                got: values.len(),
            });
        }
        self.columns.insert(name.to_string(), values);
        Ok(())
    }

    /// Borrows a column by name.
    ///
    /// # Errors
    ///
    /// Returns [`SwbError::MissingColumn`] if no such column exists.
    pub fn column(&self, name: &str) -> SwbResult<&DVector<f64>> {
        self.columns.get(name).ok_or_else(|| SwbError::MissingColumn {
            name: name.to_string(),
        })
    }
}
