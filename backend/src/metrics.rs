//! Derived quantities computed from heliocentric state vectors.
//!
//! Everything here is a pure function; constants come from the shared
//! [`PhysicalConstants`] value.

use nalgebra::Vector3;

use crate::constants::PhysicalConstants;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{Body, EphemerisRecord, StateVector, TimePoint};

/// Heliocentric distance (AU).
pub fn distance(position: &Vector3<f64>) -> f64 {
    position.norm()
}

/// Orbital speed, in the units of `velocity`.
pub fn speed(velocity: &Vector3<f64>) -> f64 {
    velocity.norm()
}

/// Ecliptic longitude of the position, in degrees within [0, 360).
pub fn orbital_angle_deg(x: f64, y: f64) -> f64 {
    let angle = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative angles
    if angle >= 360.0 {
        0.0
    } else {
        angle
    }
}

/// Irradiance at `distance_au` by the inverse-square law (W/m²).
pub fn radiation_level(constants: &PhysicalConstants, distance_au: f64) -> PipelineResult<f64> {
    if !distance_au.is_finite() {
        return Err(PipelineError::DegenerateGeometry(format!(
            "non-finite distance {distance_au}"
        )));
    }
    if distance_au == 0.0 {
        return Err(PipelineError::DegenerateGeometry(
            "body at zero distance from the Sun".to_string(),
        ));
    }
    Ok(constants.solar_constant_w_m2 / (distance_au * distance_au))
}

/// Radiative equilibrium temperature of a rapidly rotating body (K).
pub fn equilibrium_temperature_k(
    constants: &PhysicalConstants,
    irradiance_w_m2: f64,
    bond_albedo: f64,
) -> f64 {
    let absorbed = irradiance_w_m2 * (1.0 - bond_albedo);
    (absorbed / (4.0 * constants.stefan_boltzmann)).powf(0.25)
}

/// Scale an equilibrium temperature by a greenhouse factor.
pub fn apply_greenhouse(temperature_k: f64, greenhouse_factor: f64) -> f64 {
    temperature_k * greenhouse_factor
}

/// Build the persisted record for one body at one instant.
pub fn derive_record(
    constants: &PhysicalConstants,
    body: &Body,
    time: TimePoint,
    state: &StateVector,
) -> PipelineResult<EphemerisRecord> {
    if !state.position.iter().chain(state.velocity.iter()).all(|v| v.is_finite()) {
        return Err(PipelineError::DegenerateGeometry(format!(
            "non-finite state for {} at {}",
            body.name, time.label
        )));
    }

    let distance_au = distance(&state.position);
    let radiation = radiation_level(constants, distance_au)?;

    Ok(EphemerisRecord {
        body: body.name.clone(),
        time,
        position: state.position,
        velocity: state.velocity,
        distance_au,
        velocity_magnitude: speed(&state.velocity),
        orbital_angle_deg: orbital_angle_deg(state.position.x, state.position.y),
        radiation_level: radiation,
        equilibrium_temp_k: equilibrium_temperature_k(
            constants,
            radiation,
            body.profile.bond_albedo,
        ),
    })
}
