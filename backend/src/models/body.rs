//! Celestial bodies sampled by the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Static physical profile of a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyProfile {
    /// Mean heliocentric distance (AU).
    pub mean_distance_au: f64,
    /// Surface (or 1-bar) gravity relative to Earth.
    pub gravity_g: f64,
    /// Bond albedo used for equilibrium temperatures.
    pub bond_albedo: f64,
    /// Main atmospheric constituents by volume fraction.
    pub atmosphere: BTreeMap<String, f64>,
}

/// A named body with the identifier used to query the ephemeris.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub name: String,
    /// Target name understood by the ephemeris evaluator.
    pub spice_target: String,
    pub naif_id: i32,
    pub profile: BodyProfile,
}

fn atmosphere(parts: &[(&str, f64)]) -> BTreeMap<String, f64> {
    parts.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn body(
    name: &str,
    naif_id: i32,
    mean_distance_au: f64,
    gravity_g: f64,
    bond_albedo: f64,
    gases: &[(&str, f64)],
) -> Body {
    Body {
        name: name.to_string(),
        spice_target: format!("{} BARYCENTER", name.to_uppercase()),
        naif_id,
        profile: BodyProfile {
            mean_distance_au,
            gravity_g,
            bond_albedo,
            atmosphere: atmosphere(gases),
        },
    }
}

/// The nine planetary barycentres, Mercury through Pluto.
pub fn default_catalog() -> Vec<Body> {
    vec![
        body("Mercury", 1, 0.387, 0.38, 0.088, &[("O2", 0.42), ("Na", 0.29), ("H2", 0.22)]),
        body("Venus", 2, 0.723, 0.90, 0.76, &[("CO2", 0.965), ("N2", 0.035)]),
        body(
            "Earth",
            3,
            1.0,
            1.0,
            0.306,
            &[("N2", 0.78), ("O2", 0.21), ("Ar", 0.0093), ("CO2", 0.0004)],
        ),
        body("Mars", 4, 1.524, 0.38, 0.25, &[("CO2", 0.95), ("N2", 0.027), ("Ar", 0.016)]),
        body("Jupiter", 5, 5.203, 2.53, 0.343, &[("H2", 0.89), ("He", 0.10)]),
        body("Saturn", 6, 9.537, 1.07, 0.342, &[("H2", 0.96), ("He", 0.03)]),
        body("Uranus", 7, 19.19, 0.89, 0.300, &[("H2", 0.83), ("He", 0.15), ("CH4", 0.02)]),
        body("Neptune", 8, 30.07, 1.14, 0.290, &[("H2", 0.80), ("He", 0.19), ("CH4", 0.01)]),
        body("Pluto", 9, 39.48, 0.063, 0.72, &[("N2", 0.99), ("CH4", 0.005), ("CO", 0.0005)]),
    ]
}

/// Select catalogue entries by name, preserving the requested order.
///
/// An empty request selects the whole catalogue. Unknown names are returned
/// in the error list.
pub fn resolve_bodies(catalog: &[Body], names: &[String]) -> Result<Vec<Body>, Vec<String>> {
    if names.is_empty() {
        return Ok(catalog.to_vec());
    }

    let mut selected = Vec::with_capacity(names.len());
    let mut unknown = Vec::new();
    for name in names {
        match catalog.iter().find(|b| b.name.eq_ignore_ascii_case(name)) {
            Some(b) => selected.push(b.clone()),
            None => unknown.push(name.clone()),
        }
    }

    if unknown.is_empty() {
        Ok(selected)
    } else {
        Err(unknown)
    }
}
