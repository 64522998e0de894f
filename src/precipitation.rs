//! Effective precipitation.

use nalgebra::DVector;

use crate::error::SwbResult;
use crate::series::{DailySeries, column};

/// Appends the `effective_precipitation` column.
///
/// Row-wise threshold rule: 80% of the day's precipitation reaches the root
/// zone when the event is at least 20% of the reference evapotranspiration;
/// smaller events evaporate entirely.
///
/// # Errors
///
/// Fails when the `ref_evapotranspiration` or `precipitation` column is
/// missing; the series is untouched in that case.
pub fn effective_precipitation(series: &mut DailySeries) -> SwbResult<()> {
    let peff = {
        let eto = series.column(column::REF_EVAPOTRANSPIRATION)?;
        let precip = series.column(column::PRECIPITATION)?;
        DVector::from_fn(series.len(), |i, _| {
            if precip[i] >= 0.2 * eto[i] {
                0.8 * precip[i]
            } else {
                0.0
            }
        })
    };
    series.insert(column::EFFECTIVE_PRECIPITATION, peff)
}
