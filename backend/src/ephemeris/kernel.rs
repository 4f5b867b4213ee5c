//! SPK-kernel ephemeris using ANISE.
//!
//! Kernels are loaded once at startup. States are translated in the J2000
//! equatorial frame and rotated onto the mean ecliptic of J2000.

use anise::prelude::*;
use hifitime::Epoch;
use nalgebra::{Matrix3, Vector3};
use std::collections::HashMap;
use std::path::PathBuf;

use super::{
    AberrationCorrection, Coverage, EphemerisEvaluator, RawState, ECLIPTIC_FRAME, SUN_OBSERVER,
};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{Body, EphemerisTime};

/// Obliquity of the ecliptic at J2000 (arcseconds, IAU 1976).
const J2000_OBLIQUITY_ARCSEC: f64 = 84_381.448;

const SUN_NAIF_ID: i32 = 10;

pub struct KernelEvaluator {
    almanac: Almanac,
    naif_ids: HashMap<String, i32>,
    equatorial_to_ecliptic: Matrix3<f64>,
    coverage: Option<Coverage>,
    sources: Vec<PathBuf>,
}

impl KernelEvaluator {
    /// Load every kernel in `paths` and register the given bodies.
    pub fn load(paths: &[PathBuf], bodies: &[Body]) -> PipelineResult<Self> {
        if paths.is_empty() {
            return Err(PipelineError::Configuration(
                "kernel evaluator needs at least one kernel".to_string(),
            ));
        }

        let mut almanac = Almanac::default();
        for path in paths {
            let path_str = path.to_str().ok_or_else(|| {
                PipelineError::Configuration(format!("Invalid kernel path: {:?}", path))
            })?;
            log::info!("Loading ephemeris kernel {}", path.display());
            almanac = almanac.load(path_str).map_err(|e| {
                PipelineError::Configuration(format!("Failed to load {:?}: {}", path, e))
            })?;
        }

        let mut naif_ids: HashMap<String, i32> = bodies
            .iter()
            .map(|b| (b.spice_target.to_uppercase(), b.naif_id))
            .collect();
        naif_ids.insert(SUN_OBSERVER.to_string(), SUN_NAIF_ID);

        let eps = (J2000_OBLIQUITY_ARCSEC / 3600.0).to_radians();
        let (s, c) = eps.sin_cos();
        let equatorial_to_ecliptic = Matrix3::new(1.0, 0.0, 0.0, 0.0, c, s, 0.0, -s, c);

        Ok(Self {
            almanac,
            naif_ids,
            equatorial_to_ecliptic,
            coverage: None,
            sources: paths.to_vec(),
        })
    }

    pub fn with_coverage(mut self, coverage: Coverage) -> Self {
        self.coverage = Some(coverage);
        self
    }

    fn unavailable(target: &str, et: EphemerisTime, reason: impl Into<String>) -> PipelineError {
        PipelineError::EphemerisUnavailable {
            body: target.to_string(),
            et: et.seconds(),
            reason: reason.into(),
        }
    }

    fn naif_id(&self, name: &str, et: EphemerisTime) -> PipelineResult<i32> {
        self.naif_ids
            .get(&name.to_uppercase())
            .copied()
            .ok_or_else(|| Self::unavailable(name, et, "no NAIF id registered"))
    }
}

impl EphemerisEvaluator for KernelEvaluator {
    fn evaluate(
        &self,
        target: &str,
        et: EphemerisTime,
        frame: &str,
        aberration: AberrationCorrection,
        observer: &str,
    ) -> PipelineResult<RawState> {
        if frame != ECLIPTIC_FRAME {
            return Err(Self::unavailable(target, et, format!("frame {frame} not supported")));
        }
        if aberration != AberrationCorrection::None {
            return Err(Self::unavailable(
                target,
                et,
                format!("aberration correction {aberration} not supported"),
            ));
        }
        if let Some(coverage) = &self.coverage {
            if !coverage.contains(et) {
                return Err(Self::unavailable(target, et, "epoch outside loaded coverage"));
            }
        }

        let target_frame = Frame::from_ephem_j2000(self.naif_id(target, et)?);
        let observer_frame = Frame::from_ephem_j2000(self.naif_id(observer, et)?);
        let epoch = Epoch::from_et_seconds(et.seconds());

        let state = self
            .almanac
            .translate(target_frame, observer_frame, epoch, None)
            .map_err(|e| Self::unavailable(target, et, e.to_string()))?;

        let position = Vector3::new(state.radius_km.x, state.radius_km.y, state.radius_km.z);
        let velocity = Vector3::new(
            state.velocity_km_s.x,
            state.velocity_km_s.y,
            state.velocity_km_s.z,
        );

        Ok(RawState {
            position_km: self.equatorial_to_ecliptic * position,
            velocity_km_s: self.equatorial_to_ecliptic * velocity,
        })
    }

    fn describe(&self) -> String {
        let names: Vec<String> = self.sources.iter().map(|p| p.display().to_string()).collect();
        format!("SPK kernels [{}]", names.join(", "))
    }
}
