//! Orbital state sampling.
//!
//! The [`EphemerisEvaluator`] trait is the seam to whatever produces raw
//! positions and velocities: the built-in mean-element model, an SPK kernel
//! reader, or a fake in tests. [`OrbitalStateSampler`] sits on top of it and
//! only adapts units and frame names.

pub mod mean_elements;

#[cfg(feature = "spice-kernels")]
pub mod kernel;

use nalgebra::Vector3;
use std::fmt;
use std::sync::Arc;

use crate::constants::PhysicalConstants;
use crate::error::PipelineResult;
use crate::models::{Body, EphemerisTime, StateVector};

pub use mean_elements::MeanElementsEvaluator;

#[cfg(feature = "spice-kernels")]
pub use kernel::KernelEvaluator;

/// Reference frame of every sampled state: mean ecliptic and equinox of J2000.
pub const ECLIPTIC_FRAME: &str = "ECLIPJ2000";

/// Observer of every sampled state.
pub const SUN_OBSERVER: &str = "SUN";

/// Aberration correction requested from the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AberrationCorrection {
    None,
    LightTime,
    LightTimeStellar,
}

impl fmt::Display for AberrationCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            AberrationCorrection::None => "NONE",
            AberrationCorrection::LightTime => "LT",
            AberrationCorrection::LightTimeStellar => "LT+S",
        };
        f.write_str(token)
    }
}

/// Position and velocity as returned by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawState {
    pub position_km: Vector3<f64>,
    pub velocity_km_s: Vector3<f64>,
}

/// Time span an evaluator holds data for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coverage {
    pub start: EphemerisTime,
    pub end: EphemerisTime,
}

impl Coverage {
    pub fn contains(&self, et: EphemerisTime) -> bool {
        et >= self.start && et <= self.end
    }
}

/// Source of heliocentric states, loaded once and queried synchronously.
pub trait EphemerisEvaluator: Send + Sync {
    /// State of `target` relative to `observer` in `frame` at `et`.
    ///
    /// Returns `EphemerisUnavailable` when no data covers the request.
    fn evaluate(
        &self,
        target: &str,
        et: EphemerisTime,
        frame: &str,
        aberration: AberrationCorrection,
        observer: &str,
    ) -> PipelineResult<RawState>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Samples bodies as heliocentric ecliptic states in AU and AU/day.
#[derive(Clone)]
pub struct OrbitalStateSampler {
    evaluator: Arc<dyn EphemerisEvaluator>,
    constants: Arc<PhysicalConstants>,
}

impl OrbitalStateSampler {
    pub fn new(evaluator: Arc<dyn EphemerisEvaluator>, constants: Arc<PhysicalConstants>) -> Self {
        Self {
            evaluator,
            constants,
        }
    }

    pub fn constants(&self) -> &PhysicalConstants {
        &self.constants
    }

    pub fn sample(&self, body: &Body, et: EphemerisTime) -> PipelineResult<StateVector> {
        let raw = self.evaluator.evaluate(
            &body.spice_target,
            et,
            ECLIPTIC_FRAME,
            AberrationCorrection::None,
            SUN_OBSERVER,
        )?;

        Ok(StateVector {
            position: raw.position_km / self.constants.au_km,
            velocity: raw.velocity_km_s * self.constants.km_s_to_au_day(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::models::default_catalog;

    struct FixedEvaluator;

    impl EphemerisEvaluator for FixedEvaluator {
        fn evaluate(
            &self,
            target: &str,
            et: EphemerisTime,
            frame: &str,
            aberration: AberrationCorrection,
            observer: &str,
        ) -> PipelineResult<RawState> {
            assert_eq!(frame, ECLIPTIC_FRAME);
            assert_eq!(observer, SUN_OBSERVER);
            assert_eq!(aberration, AberrationCorrection::None);
            if target != "EARTH BARYCENTER" {
                return Err(PipelineError::EphemerisUnavailable {
                    body: target.to_string(),
                    et: et.seconds(),
                    reason: "not loaded".to_string(),
                });
            }
            Ok(RawState {
                position_km: Vector3::new(149_597_870.7, 0.0, 0.0),
                velocity_km_s: Vector3::new(0.0, 29.78, 0.0),
            })
        }

        fn describe(&self) -> String {
            "fixed".to_string()
        }
    }

    fn sampler() -> OrbitalStateSampler {
        OrbitalStateSampler::new(Arc::new(FixedEvaluator), Arc::new(PhysicalConstants::default()))
    }

    #[test]
    fn test_sample_converts_units() {
        let earth = default_catalog().remove(2);
        let state = sampler().sample(&earth, EphemerisTime::new(0.0)).unwrap();
        assert!((state.position.x - 1.0).abs() < 1e-12);
        // 29.78 km/s is about 0.0172 AU/day
        assert!((state.velocity.y - 29.78 * 86_400.0 / 149_597_870.7).abs() < 1e-12);
        assert!((state.velocity.y - 0.0172).abs() < 1e-4);
    }

    #[test]
    fn test_sample_propagates_unavailable() {
        let mars = default_catalog().remove(3);
        let err = sampler().sample(&mars, EphemerisTime::new(0.0)).unwrap_err();
        assert!(matches!(err, PipelineError::EphemerisUnavailable { .. }));
    }

    #[test]
    fn test_aberration_tokens() {
        assert_eq!(AberrationCorrection::None.to_string(), "NONE");
        assert_eq!(AberrationCorrection::LightTimeStellar.to_string(), "LT+S");
    }
}
