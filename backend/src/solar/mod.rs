//! Cyclical solar-activity model.
//!
//! Every quantity is a pure function of the calendar date (plus an injected
//! random source for the cosmic-ray term), so any single day can be evaluated
//! without walking the rest of the series.
//!
//! All periodic terms share one phase anchor: a date at which the Schwabe
//! cycle peaked. The sunspot number is the product of
//!
//! * `|sin|` of the 22-year magnetic cycle, i.e. an 11-year activity cycle
//!   that peaks at the anchor and vanishes 5.5 years later,
//! * an 88-year Gleissberg modulator in `[0.5, 1.0]`,
//! * a 210-year Suess/de Vries modulator in `[0.6, 1.0]`,
//! * an intra-year modulator in `[0.8, 1.0]` keyed on day of year.

pub mod ingest;

use chrono::{Datelike, NaiveDate};
use rand::Rng;
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::sync::Arc;

use crate::constants::{PhysicalConstants, DAYS_PER_JULIAN_YEAR};
use crate::error::{PipelineError, PipelineResult};
use crate::models::SolarActivitySample;

/// Length of the Schwabe activity cycle (years).
pub const SCHWABE_CYCLE_YEARS: f64 = 11.0;
/// Gleissberg cycle (years).
pub const GLEISSBERG_CYCLE_YEARS: f64 = 88.0;
/// Suess / de Vries cycle (years).
pub const SUESS_CYCLE_YEARS: f64 = 210.0;

/// Default phase anchor: maximum of solar cycle 24 (April 2014).
pub fn default_anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2014, 4, 1).unwrap_or_default()
}

/// Inputs to the UV flux estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvInputs {
    /// Observed 10.7 cm radio flux index (SFU).
    pub f10_7: Option<f64>,
    pub sunspot_number: Option<f64>,
    pub distance_au: f64,
    /// Fraction transmitted by the atmosphere, 1.0 for none.
    pub atmospheric_attenuation: f64,
}

impl UvInputs {
    /// UV at 1 AU above the atmosphere for a sunspot number.
    pub fn from_sunspots(sunspot_number: f64) -> Self {
        Self {
            f10_7: None,
            sunspot_number: Some(sunspot_number),
            distance_au: 1.0,
            atmospheric_attenuation: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolarActivityModel {
    constants: Arc<PhysicalConstants>,
    anchor: NaiveDate,
}

impl SolarActivityModel {
    pub fn new(constants: Arc<PhysicalConstants>, anchor: NaiveDate) -> Self {
        Self { constants, anchor }
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    fn days_from_anchor(&self, date: NaiveDate) -> f64 {
        (date - self.anchor).num_days() as f64
    }

    /// Modelled daily sunspot number.
    pub fn sunspot_number(&self, date: NaiveDate) -> f64 {
        let years = self.days_from_anchor(date) / DAYS_PER_JULIAN_YEAR;

        let core = (PI * years / SCHWABE_CYCLE_YEARS + FRAC_PI_2).sin().abs();
        let gleissberg = 0.75 + 0.25 * (TAU * years / GLEISSBERG_CYCLE_YEARS).cos();
        let suess = 0.8 + 0.2 * (TAU * years / SUESS_CYCLE_YEARS).cos();

        let day_shift = date.ordinal() as f64 - self.anchor.ordinal() as f64;
        let intra_year = 0.9 + 0.1 * (TAU * day_shift / DAYS_PER_JULIAN_YEAR).cos();

        self.constants.sunspot_base_amplitude * core * gleissberg * suess * intra_year
    }

    /// F10.7 index estimated from a sunspot number.
    pub fn estimate_f10_7(&self, sunspot_number: f64) -> f64 {
        self.constants.f107_intercept + self.constants.f107_slope * sunspot_number
    }

    /// UV flux (W/m²) scaled by radio activity, distance and attenuation.
    pub fn uv_flux(&self, inputs: UvInputs) -> PipelineResult<f64> {
        let f10_7 = match (inputs.f10_7, inputs.sunspot_number) {
            (Some(f), _) => f,
            (None, Some(ssn)) => self.estimate_f10_7(ssn),
            (None, None) => {
                return Err(PipelineError::InsufficientInputs(
                    "uv flux needs an F10.7 index or a sunspot number".to_string(),
                ))
            }
        };

        let d = inputs.distance_au;
        if !d.is_finite() || d <= 0.0 {
            return Err(PipelineError::DegenerateGeometry(format!(
                "uv flux at distance {d} AU"
            )));
        }

        Ok(self.constants.uv_base_flux()
            * (f10_7 / 100.0)
            * (1.0 / (d * d))
            * inputs.atmospheric_attenuation)
    }

    /// Modulation potential (MV) implied by a sunspot number.
    pub fn modulation_potential_mv(&self, sunspot_number: f64) -> f64 {
        self.constants.modulation_base_mv + self.constants.modulation_per_sunspot_mv * sunspot_number
    }

    /// Galactic cosmic-ray flux with a ±5 % stochastic factor drawn from `rng`.
    pub fn cosmic_flux<R: Rng + ?Sized>(&self, modulation_potential_mv: f64, rng: &mut R) -> f64 {
        let noise: f64 = rng.gen_range(0.95..1.05);
        self.constants.cosmic_base_flux * (-modulation_potential_mv / 1000.0).exp() * noise
    }

    /// Solar radio flux (SFU).
    pub fn solar_flux(&self, date: NaiveDate) -> f64 {
        let phase = TAU * self.days_from_anchor(date) / self.constants.solar_flux_period_days;
        self.constants.solar_flux_base_sfu + self.constants.solar_flux_amplitude_sfu * phase.cos()
    }

    /// All four quantities for one day.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        date: NaiveDate,
        rng: &mut R,
    ) -> PipelineResult<SolarActivitySample> {
        let sunspot_number = self.sunspot_number(date);
        let uv_flux = self.uv_flux(UvInputs::from_sunspots(sunspot_number))?;
        let cosmic_flux = self.cosmic_flux(self.modulation_potential_mv(sunspot_number), rng);

        Ok(SolarActivitySample {
            date,
            sunspot_number,
            uv_flux,
            cosmic_flux,
            solar_flux: self.solar_flux(date),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn model() -> SolarActivityModel {
        SolarActivityModel::new(Arc::new(PhysicalConstants::default()), default_anchor())
    }

    #[test]
    fn test_solar_flux_peaks_at_anchor() {
        let m = model();
        assert!((m.solar_flux(default_anchor()) - 90.0).abs() < 1e-9);
        let trough = default_anchor() + chrono::Duration::days(4015 / 2);
        assert!(m.solar_flux(trough) < 40.1);
    }

    #[test]
    fn test_uv_flux_from_observed_index() {
        let m = model();
        let uv = m
            .uv_flux(UvInputs {
                f10_7: Some(100.0),
                sunspot_number: None,
                distance_au: 1.0,
                atmospheric_attenuation: 1.0,
            })
            .unwrap();
        assert!((uv - 1361.0 * 0.08).abs() < 1e-9);
    }

    #[test]
    fn test_observed_index_wins_over_sunspots() {
        let m = model();
        let both = m
            .uv_flux(UvInputs {
                f10_7: Some(150.0),
                sunspot_number: Some(0.0),
                distance_au: 2.0,
                atmospheric_attenuation: 0.5,
            })
            .unwrap();
        assert!((both - 108.88 * 1.5 / 4.0 * 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_cosmic_flux_bounds() {
        let m = model();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let flux = m.cosmic_flux(0.0, &mut rng);
            assert!((4.0 * 0.95..4.0 * 1.05).contains(&flux));
        }
    }
}
