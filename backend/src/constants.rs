//! Physical constants shared by every model in the crate.
//!
//! A single [`PhysicalConstants`] value is built at startup (from the
//! `[constants]` table of the configuration file, falling back to the
//! defaults below) and handed to each component behind an `Arc`, so the
//! solar constant and friends have exactly one definition per run.

use serde::{Deserialize, Serialize};

/// Seconds in one ephemeris day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Julian date of the J2000 epoch (2000-01-01 12:00:00 TDB).
pub const J2000_JD: f64 = 2_451_545.0;

/// Days in a Julian year, used for slow periodic terms.
pub const DAYS_PER_JULIAN_YEAR: f64 = 365.25;

/// Immutable set of physical constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalConstants {
    /// Total solar irradiance at 1 AU (W/m²).
    pub solar_constant_w_m2: f64,
    /// Kilometres per astronomical unit.
    pub au_km: f64,
    /// Stefan–Boltzmann constant (W m⁻² K⁻⁴).
    pub stefan_boltzmann: f64,
    /// Share of the total irradiance emitted in the UV band.
    pub uv_fraction_of_tsi: f64,
    /// Intercept of the F10.7 regression on sunspot number.
    pub f107_intercept: f64,
    /// Slope of the F10.7 regression on sunspot number.
    pub f107_slope: f64,
    /// Unmodulated galactic cosmic-ray flux (particles cm⁻² s⁻¹).
    pub cosmic_base_flux: f64,
    /// Modulation potential at zero sunspots (MV).
    pub modulation_base_mv: f64,
    /// Modulation potential added per sunspot (MV).
    pub modulation_per_sunspot_mv: f64,
    /// Base amplitude of the sunspot model.
    pub sunspot_base_amplitude: f64,
    /// Mean solar radio flux (SFU).
    pub solar_flux_base_sfu: f64,
    /// Radio flux swing around the mean (SFU).
    pub solar_flux_amplitude_sfu: f64,
    /// Period of the radio flux sinusoid (days).
    pub solar_flux_period_days: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            solar_constant_w_m2: 1361.0,
            au_km: 149_597_870.7,
            stefan_boltzmann: 5.670_374_419e-8,
            uv_fraction_of_tsi: 0.08,
            f107_intercept: 67.0,
            f107_slope: 0.6,
            cosmic_base_flux: 4.0,
            modulation_base_mv: 300.0,
            modulation_per_sunspot_mv: 4.0,
            sunspot_base_amplitude: 100.0,
            solar_flux_base_sfu: 65.0,
            solar_flux_amplitude_sfu: 25.0,
            solar_flux_period_days: 4015.0,
        }
    }
}

impl PhysicalConstants {
    /// UV flux at 1 AU for an F10.7 index of 100.
    pub fn uv_base_flux(&self) -> f64 {
        self.solar_constant_w_m2 * self.uv_fraction_of_tsi
    }

    /// Conversion factor from km/s to AU/day.
    pub fn km_s_to_au_day(&self) -> f64 {
        SECONDS_PER_DAY / self.au_km
    }
}
