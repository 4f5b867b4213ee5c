use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

use super::schema::{
    ephemeris_data, planets, solar_activity, stream_cursors, sunspot_observations, uv_flux_data,
};

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = planets)]
pub struct NewPlanetRow {
    pub name: String,
    pub spice_target: String,
    pub naif_id: i32,
    pub mean_distance_au: f64,
    pub gravity_g: f64,
    pub bond_albedo: f64,
    pub atmosphere: Value,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ephemeris_data)]
pub struct NewEphemerisRow {
    pub planet: String,
    pub et: f64,
    pub et_ms: i64,
    pub date: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    pub distance_au: f64,
    pub velocity_magnitude: f64,
    pub orbital_angle_deg: f64,
    pub radiation_level: f64,
    pub equilibrium_temp_k: f64,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = ephemeris_data)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EphemerisRow {
    pub planet: String,
    pub et: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    pub distance_au: f64,
    pub velocity_magnitude: f64,
    pub orbital_angle_deg: f64,
    pub radiation_level: f64,
    pub equilibrium_temp_k: f64,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = stream_cursors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StreamCursorRow {
    pub run_key: String,
    pub last_et: f64,
    pub last_label: String,
    pub records_written: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = solar_activity)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SolarActivityRow {
    pub date: NaiveDate,
    pub sunspot_number: f64,
    pub uv_flux: f64,
    pub cosmic_flux: f64,
    pub solar_flux: f64,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = solar_activity)]
pub struct NewSolarActivityRow {
    pub date: NaiveDate,
    pub sunspot_number: f64,
    pub uv_flux: f64,
    pub cosmic_flux: f64,
    pub solar_flux: f64,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = uv_flux_data)]
pub struct NewFluxRow {
    pub obs_date: NaiveDate,
    pub obs_time: NaiveTime,
    pub julian_date: f64,
    pub carrington_rotation: f64,
    pub observed_flux: f64,
    pub adjusted_flux: f64,
    pub ursi_flux: f64,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sunspot_observations)]
pub struct NewSunspotRow {
    pub obs_date: NaiveDate,
    pub decimal_year: f64,
    pub sunspot_number: f64,
    pub std_dev: Option<f64>,
    pub observations: Option<i32>,
    pub definitive: bool,
}
