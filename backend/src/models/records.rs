//! Records produced by the pipeline and the text ingesters.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::time::{CalendarLabel, EphemerisTime, TimePoint};

/// Heliocentric state in the ecliptic J2000 frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    /// Position (AU).
    pub position: Vector3<f64>,
    /// Velocity (AU/day).
    pub velocity: Vector3<f64>,
}

/// One body at one instant, with its derived metrics. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EphemerisRecord {
    pub body: String,
    pub time: TimePoint,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub distance_au: f64,
    /// Speed (AU/day).
    pub velocity_magnitude: f64,
    pub orbital_angle_deg: f64,
    /// Irradiance at the body (W/m²).
    pub radiation_level: f64,
    /// Radiative equilibrium temperature without greenhouse forcing (K).
    pub equilibrium_temp_k: f64,
}

impl EphemerisRecord {
    /// Natural key of the record in storage.
    pub fn key(&self) -> (String, i64) {
        (self.body.clone(), et_key(self.time.et))
    }
}

/// Integer millisecond key for an ephemeris time, stable under float noise.
pub fn et_key(et: EphemerisTime) -> i64 {
    (et.seconds() * 1000.0).round() as i64
}

/// Modelled solar activity for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarActivitySample {
    pub date: NaiveDate,
    pub sunspot_number: f64,
    /// UV flux at 1 AU (W/m²).
    pub uv_flux: f64,
    /// Galactic cosmic-ray flux (particles cm⁻² s⁻¹).
    pub cosmic_flux: f64,
    /// Solar radio flux (SFU).
    pub solar_flux: f64,
}

/// One row of the Penticton 10.7 cm flux table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluxObservation {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub julian_date: f64,
    pub carrington_rotation: f64,
    pub observed_flux: f64,
    pub adjusted_flux: f64,
    pub ursi_flux: f64,
}

/// One row of the daily total sunspot number series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunspotObservation {
    pub date: NaiveDate,
    pub decimal_year: f64,
    pub sunspot_number: f64,
    pub std_dev: Option<f64>,
    pub observations: Option<i32>,
    pub definitive: bool,
}

/// Resume point of a streaming run: the last step whose records are all committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamCursor {
    pub run_key: String,
    pub last_et: EphemerisTime,
    pub last_label: CalendarLabel,
    pub records_written: u64,
    pub updated_at: DateTime<Utc>,
}

/// Datasets whose population can be probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Bodies,
    Ephemeris,
    SolarActivity,
    UvFlux,
    Sunspots,
}

impl DatasetKind {
    /// Backing table name.
    pub fn table_name(&self) -> &'static str {
        match self {
            DatasetKind::Bodies => "planets",
            DatasetKind::Ephemeris => "ephemeris_data",
            DatasetKind::SolarActivity => "solar_activity",
            DatasetKind::UvFlux => "uv_flux_data",
            DatasetKind::Sunspots => "sunspot_observations",
        }
    }

    pub fn all() -> &'static [DatasetKind] {
        &[
            DatasetKind::Bodies,
            DatasetKind::Ephemeris,
            DatasetKind::SolarActivity,
            DatasetKind::UvFlux,
            DatasetKind::Sunspots,
        ]
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for DatasetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bodies" | "planets" => Ok(Self::Bodies),
            "ephemeris" | "ephemeris_data" => Ok(Self::Ephemeris),
            "solar" | "solar_activity" => Ok(Self::SolarActivity),
            "uv_flux" | "uv_flux_data" | "flux" => Ok(Self::UvFlux),
            "sunspots" | "sunspot_observations" => Ok(Self::Sunspots),
            _ => Err(format!("Unknown dataset: {}", s)),
        }
    }
}
