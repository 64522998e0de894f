//! FAO-56 root zone water balance.
//!
//! A strictly sequential daily recurrence: each day's depletion is computed
//! from the previous day's depletion and moisture together with that day's
//! effective precipitation, crop evapotranspiration, and irrigation input.

use nalgebra::DVector;
use serde::Deserialize;
use tracing::debug;

use crate::error::{SwbError, SwbResult};
use crate::series::{DailySeries, column};

/// Soil and crop constants for one balance run.
///
/// Moisture values are volumetric fractions; `zr * zr_factor` converts a
/// fraction to a water depth over the root zone [mm].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BalanceParameters {
    /// Saturation moisture [-].
    pub theta_s: f64,
    /// Field capacity moisture [-].
    pub theta_fc: f64,
    /// Wilting point moisture [-].
    pub theta_wp: f64,
    /// Root depth [m].
    pub zr: f64,
    /// Unit conversion for root depth, 1000 for metres to millimetres.
    pub zr_factor: f64,
    /// Depletion fraction that can be extracted without stress [-].
    pub p: f64,
    /// Days for drainage of water in excess of field capacity [day].
    pub draintime: f64,
    /// Moisture on the day before the series starts [-].
    pub theta_init: f64,
    /// Fraction of depletion an advised irrigation refills [-].
    pub refill_factor: f64,
}

impl BalanceParameters {
    /// Checks the parameters are physically usable.
    pub fn validate(&self) -> SwbResult<()> {
        let fail = |reason: &str| {
            Err(SwbError::InvalidParameters {
                reason: reason.to_string(),
            })
        };
        if !(self.theta_wp < self.theta_fc && self.theta_fc <= self.theta_s) {
            return fail("moisture constants must satisfy theta_wp < theta_fc <= theta_s");
        }
        if self.zr <= 0.0 || self.zr_factor <= 0.0 {
            return fail("zr and zr_factor must be positive");
        }
        if !(self.p > 0.0 && self.p < 1.0) {
            return fail("p must lie strictly between 0 and 1");
        }
        if self.draintime <= 0.0 {
            return fail("draintime must be positive");
        }
        if !(self.theta_init > 0.0 && self.theta_init <= self.theta_s) {
            return fail("theta_init must lie in (0, theta_s]");
        }
        if self.refill_factor <= 0.0 {
            return fail("refill_factor must be positive");
        }
        Ok(())
    }

    /// Root zone depth as a water-depth multiplier [mm].
    fn root_mm(&self) -> f64 {
        self.zr * self.zr_factor
    }

    /// Total available water [mm].
    pub fn taw(&self) -> f64 {
        (self.theta_fc - self.theta_wp) * self.root_mm()
    }

    /// Readily available water, the no-stress depletion threshold [mm].
    pub fn raw(&self) -> f64 {
        self.p * self.taw()
    }

    /// Depletion equivalent to a moisture value [mm].
    pub fn dr_from_theta(&self, theta: f64) -> f64 {
        (self.theta_fc - theta) * self.root_mm()
    }

    /// Moisture equivalent to a depletion value [-].
    pub fn theta_from_dr(&self, dr: f64) -> f64 {
        self.theta_fc - dr / self.root_mm()
    }

    /// Water stress coefficient for a given depletion [-].
    ///
    /// Unity until depletion exceeds [`raw`](Self::raw), then a linear
    /// falloff reaching zero at [`taw`](Self::taw).
    pub fn ks(&self, dr: f64) -> f64 {
        ((self.taw() - dr) / ((1.0 - self.p) * self.taw())).min(1.0)
    }

    /// Runoff: the part of today's precipitation that would push yesterday's
    /// moisture above saturation [mm].
    pub fn ro(&self, peff: f64, theta_prev: f64) -> f64 {
        (peff + (theta_prev - self.theta_s) * self.root_mm()).max(0.0)
    }

    /// Deep percolation: excess over field capacity drains over
    /// `draintime` days [mm]. Yesterday's moisture is capped at saturation.
    pub fn dp(&self, theta_prev: f64, peff: f64) -> f64 {
        (theta_prev.min(self.theta_s) * self.root_mm() - self.theta_fc * self.root_mm() + peff)
            .max(0.0)
            / self.draintime
    }

    /// Depletion ceiling below zero: the over-saturation bound [mm].
    fn dr_saturation(&self) -> f64 {
        (self.theta_fc - self.theta_s) * self.root_mm()
    }

    /// Resolves the day's irrigation input into the amount the balance
    /// charges [mm].
    fn assumed_net_irrigation(
        &self,
        irrigation: Irrigation,
        dr_no_irrigation: f64,
        recommended: f64,
    ) -> f64 {
        match irrigation {
            Irrigation::None => 0.0,
            Irrigation::Amount(amount) => amount,
            Irrigation::Model => recommended,
            Irrigation::FillToCapacity => {
                let floor = self.dr_saturation();
                if dr_no_irrigation > 0.0 {
                    dr_no_irrigation
                } else if dr_no_irrigation < floor {
                    // Over-saturated beyond the ceiling: drain back to it.
                    dr_no_irrigation - floor
                } else {
                    0.0
                }
            }
        }
    }
}

/// Per-day irrigation input, resolved once per row.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Irrigation {
    /// No water applied.
    #[default]
    None,
    /// Measured amount applied that day [mm].
    Amount(f64),
    /// Apply whatever the model recommends that day.
    Model,
    /// Refill the root zone to field capacity.
    FillToCapacity,
}

/// Carried state of the recurrence: the previous day's depletion [mm] and
/// moisture [-].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayState {
    /// Root zone depletion at the end of the previous day [mm].
    pub depletion: f64,
    /// Root zone moisture at the end of the previous day [-].
    pub moisture: f64,
}

impl DayState {
    /// Initial state on the day before the series starts.
    pub fn initialize(params: &BalanceParameters) -> Self {
        Self {
            depletion: params.dr_from_theta(params.theta_init),
            moisture: params.theta_init,
        }
    }
}

/// Scalar outputs of a run, invariant over its days.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceSummary {
    /// Total available water [mm].
    pub taw: f64,
    /// Readily available water [mm].
    pub raw: f64,
}

struct DayOutput {
    dr: f64,
    theta: f64,
    ks: f64,
    recommended: f64,
    assumed: f64,
}

/// Day-by-day water balance engine.
///
/// Owns the carried [`DayState`] for the duration of one run; every call to
/// [`run`](Self::run) re-seeds it from `theta_init`, so the engine can be
/// reused and independent engines can run concurrently.
#[derive(Debug)]
pub struct WaterBalance {
    params: BalanceParameters,
    state: DayState,
}

impl WaterBalance {
    /// Creates an engine after validating the parameters.
    pub fn new(params: BalanceParameters) -> SwbResult<Self> {
        params.validate()?;
        Ok(Self {
            state: DayState::initialize(&params),
            params,
        })
    }

    /// The parameters the engine was built with.
    pub fn params(&self) -> &BalanceParameters {
        &self.params
    }

    /// Advances the recurrence by one day.
    fn step(&mut self, peff: f64, etc: f64, irrigation: Irrigation) -> DayOutput {
        let p = &self.params;
        let taw = p.taw();
        let raw = p.raw();

        let ks = p.ks(self.state.depletion);
        let ro = p.ro(peff, self.state.moisture);
        let dp = p.dp(self.state.moisture, peff);
        let dr_no_irrigation = self.state.depletion - (peff - ro) + etc * ks + dp;

        // Informational regardless of how irrigation is supplied.
        let recommended = if dr_no_irrigation > raw {
            dr_no_irrigation * p.refill_factor
        } else {
            0.0
        };

        let assumed = p.assumed_net_irrigation(irrigation, dr_no_irrigation, recommended);

        // Clamped at taw (completely dry); no floor, negative depletion
        // represents over-saturation.
        let dr = (dr_no_irrigation - assumed).min(taw);
        let theta = p.theta_from_dr(dr);
        self.state = DayState {
            depletion: dr,
            moisture: theta,
        };
        DayOutput {
            dr,
            theta,
            ks,
            recommended,
            assumed,
        }
    }

    /// Runs the balance over the series, appending the `dr`, `theta`, `ks`,
    /// `recommended_net_irrigation`, and `assumed_net_irrigation` columns.
    ///
    /// `irrigation` supplies one [`Irrigation`] per row. The state is
    /// re-seeded from `theta_init` at the start of every run.
    ///
    /// # Errors
    ///
    /// Returns [`SwbError::MissingColumn`] when the series lacks
    /// `effective_precipitation` or `crop_evapotranspiration`, and
    /// [`SwbError::LengthMismatch`] when the irrigation schedule does not
    /// match the series length; the series is untouched in both cases.
    #[tracing::instrument(skip(self, series, irrigation), fields(n_days = series.len()))]
    pub fn run(
        &mut self,
        series: &mut DailySeries,
        irrigation: &[Irrigation],
    ) -> SwbResult<BalanceSummary> {
        let n = series.len();
        if irrigation.len() != n {
            return Err(SwbError::LengthMismatch {
                name: column::ACTUAL_NET_IRRIGATION.to_string(),
                expected: n,
                got: irrigation.len(),
            });
        }
        let peff = series.column(column::EFFECTIVE_PRECIPITATION)?.clone();
        let etc = series.column(column::CROP_EVAPOTRANSPIRATION)?.clone();

        self.state = DayState::initialize(&self.params);
        let summary = BalanceSummary {
            taw: self.params.taw(),
            raw: self.params.raw(),
        };
        debug!(taw = summary.taw, raw = summary.raw, "starting balance run");

        let mut dr = DVector::zeros(n);
        let mut theta = DVector::zeros(n);
        let mut ks = DVector::zeros(n);
        let mut recommended = DVector::zeros(n);
        let mut assumed = DVector::zeros(n);
        for i in 0..n {
            let out = self.step(peff[i], etc[i], irrigation[i]);
            dr[i] = out.dr;
            theta[i] = out.theta;
            ks[i] = out.ks;
            recommended[i] = out.recommended;
            assumed[i] = out.assumed;
        }

        series.insert(column::DR, dr)?;
        series.insert(column::THETA, theta)?;
        series.insert(column::KS, ks)?;
        series.insert(column::RECOMMENDED_NET_IRRIGATION, recommended)?;
        series.insert(column::ASSUMED_NET_IRRIGATION, assumed)?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    // Silt loam constants shared by the pointwise checks.
    fn params() -> BalanceParameters {
        BalanceParameters {
            theta_s: 0.425,
            theta_fc: 0.287,
            theta_wp: 0.14,
            zr: 0.5,
            zr_factor: 1000.0,
            p: 0.5,
            draintime: 16.2,
            theta_init: 0.2,
            refill_factor: 1.0,
        }
    }

    #[test]
    fn taw_and_raw() {
        let p = params();
        assert_abs_diff_eq!(p.taw(), 73.5, epsilon = 1e-9);
        assert_abs_diff_eq!(p.raw(), 36.75, epsilon = 1e-9);
    }

    #[test]
    fn depletion_moisture_conversions() {
        let p = params();
        assert_abs_diff_eq!(p.dr_from_theta(0.277326), 4.837, epsilon = 5e-4);
        assert_abs_diff_eq!(p.theta_from_dr(4.837), 0.277, epsilon = 5e-4);
    }

    #[test]
    fn stress_coefficient_falloff_and_clamp() {
        let p = params();
        assert_abs_diff_eq!(p.ks(37.746), 0.973, epsilon = 5e-4);
        assert_abs_diff_eq!(p.ks(30.0), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.ks(p.taw()), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn runoff_only_above_saturation() {
        let p = params();
        // Already saturated: all 15 mm run off.
        assert_abs_diff_eq!(p.ro(15.0, 0.425), 15.0, epsilon = 1e-9);
        // Practically dry soil absorbs a 2 mm event.
        assert_abs_diff_eq!(p.ro(2.0, 0.14), 0.0);
    }

    #[test]
    fn deep_percolation_above_field_capacity() {
        let p = params();
        assert_abs_diff_eq!(p.dp(0.311, 0.0), 0.741, epsilon = 5e-4);
        assert_abs_diff_eq!(p.dp(0.186, 0.0), 0.0);
    }

    #[test]
    fn deep_percolation_caps_moisture_at_saturation() {
        let mut p = params();
        p.draintime = 16.3;
        assert_abs_diff_eq!(p.dp(0.4, 20.0), 4.69325153, epsilon = 1e-6);
        assert_abs_diff_eq!(p.dp(0.5, 20.0), 5.46012270, epsilon = 1e-6);
    }

    #[test]
    fn initial_state_comes_from_theta_init() {
        let p = params();
        let s = DayState::initialize(&p);
        assert_abs_diff_eq!(s.moisture, 0.2);
        assert_abs_diff_eq!(s.depletion, (0.287 - 0.2) * 500.0, epsilon = 1e-9);
    }

    #[test]
    fn validate_rejects_disordered_moisture_constants() {
        let mut p = params();
        p.theta_fc = 0.5;
        assert!(matches!(
            p.validate(),
            Err(SwbError::InvalidParameters { .. })
        ));
        let mut p = params();
        p.theta_wp = 0.3;
        assert!(p.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_scalars() {
        let patches: [fn(&mut BalanceParameters); 5] = [
            |p| p.zr = 0.0,
            |p| p.p = 1.0,
            |p| p.draintime = 0.0,
            |p| p.theta_init = 0.6,
            |p| p.refill_factor = 0.0,
        ];
        for patch in patches {
            let mut p = params();
            patch(&mut p);
            assert!(p.validate().is_err());
        }
    }

    #[test]
    fn fill_to_capacity_refills_positive_depletion() {
        let mut engine = WaterBalance::new(params()).unwrap();
        // Dry start: depletion 43.5 mm, a 5 mm unstressed draw on top.
        engine.state = DayState {
            depletion: 43.5,
            moisture: params().theta_from_dr(43.5),
        };
        let out = engine.step(0.0, 5.0, Irrigation::FillToCapacity);
        assert!(out.assumed > 0.0);
        assert_abs_diff_eq!(out.dr, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn fill_to_capacity_policy_branches() {
        let p = params();
        let fill = Irrigation::FillToCapacity;
        // dr_saturation is -69 mm for these constants.
        assert_abs_diff_eq!(p.assumed_net_irrigation(fill, 12.5, 0.0), 12.5);
        // Between saturation ceiling and field capacity: leave it alone.
        assert_abs_diff_eq!(p.assumed_net_irrigation(fill, -30.0, 0.0), 0.0);
        // Over-saturated beyond the ceiling: negative supply drains to it.
        assert_abs_diff_eq!(
            p.assumed_net_irrigation(fill, -75.0, 0.0),
            -75.0 - p.dr_saturation(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn supplied_amount_and_none_agree_on_zero() {
        let p = params();
        let mut a = WaterBalance::new(p).unwrap();
        let mut b = WaterBalance::new(p).unwrap();
        let x = a.step(1.0, 3.0, Irrigation::Amount(0.0));
        let y = b.step(1.0, 3.0, Irrigation::None);
        assert_eq!(x.dr, y.dr);
        assert_eq!(x.assumed, y.assumed);
    }
}
