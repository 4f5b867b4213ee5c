//! Analytic ephemeris from JPL's approximate Keplerian elements.
//!
//! Elements and their linear rates per Julian century come from the
//! 3000 B.C. to 3000 A.D. fit (Standish, "Keplerian Elements for Approximate
//! Positions of the Major Planets"), including the extra mean-anomaly terms
//! for Jupiter through Pluto. Positions are heliocentric, ecliptic J2000;
//! velocities are central differences of the position.

use nalgebra::{Matrix3, Vector3};
use std::f64::consts::TAU;

use super::{
    AberrationCorrection, Coverage, EphemerisEvaluator, RawState, ECLIPTIC_FRAME, SUN_OBSERVER,
};
use crate::constants::PhysicalConstants;
use crate::error::{PipelineError, PipelineResult};
use crate::models::EphemerisTime;

const DAYS_PER_CENTURY: f64 = 36_525.0;
const DIFFERENCE_STEP_SECONDS: f64 = 60.0;

/// Mean elements at J2000 with rates per century.
#[derive(Debug, Clone, Copy)]
struct PlanetElements {
    target: &'static str,
    /// a (AU), e, I (deg), L (deg), long. perihelion (deg), long. node (deg)
    base: [f64; 6],
    rates: [f64; 6],
    /// b, c, s, f terms added to the mean anomaly
    extra: [f64; 4],
}

const NO_EXTRA: [f64; 4] = [0.0, 0.0, 0.0, 0.0];

const PLANETS: [PlanetElements; 9] = [
    PlanetElements {
        target: "MERCURY BARYCENTER",
        base: [0.38709843, 0.20563661, 7.00559432, 252.25166724, 77.45771895, 48.33961819],
        rates: [0.0, 0.00002123, -0.00590158, 149472.67486623, 0.15940013, -0.12214182],
        extra: NO_EXTRA,
    },
    PlanetElements {
        target: "VENUS BARYCENTER",
        base: [0.72332102, 0.00676399, 3.39777545, 181.97970850, 131.76755713, 76.67261496],
        rates: [-0.00000026, -0.00005107, 0.00043494, 58517.81560260, 0.05679648, -0.27274174],
        extra: NO_EXTRA,
    },
    PlanetElements {
        target: "EARTH BARYCENTER",
        base: [1.00000018, 0.01673163, -0.00054346, 100.46691572, 102.93005885, -5.11260389],
        rates: [-0.00000003, -0.00003661, -0.01337178, 35999.37306329, 0.31795260, -0.24123856],
        extra: NO_EXTRA,
    },
    PlanetElements {
        target: "MARS BARYCENTER",
        base: [1.52371243, 0.09336511, 1.85181869, -4.56813164, -23.91744784, 49.71320984],
        rates: [0.00000097, 0.00009149, -0.00724757, 19140.29934243, 0.45223625, -0.26852431],
        extra: NO_EXTRA,
    },
    PlanetElements {
        target: "JUPITER BARYCENTER",
        base: [5.20248019, 0.04853590, 1.29861416, 34.33479152, 14.27495244, 100.29282654],
        rates: [-0.00002864, 0.00018026, -0.00322699, 3034.90371757, 0.18199196, 0.13024619],
        extra: [-0.00012452, 0.06064060, -0.35635438, 38.35125000],
    },
    PlanetElements {
        target: "SATURN BARYCENTER",
        base: [9.54149883, 0.05550825, 2.49424102, 50.07571329, 92.86136063, 113.63998702],
        rates: [-0.00003065, -0.00032044, 0.00451969, 1222.11494724, 0.54179478, -0.25015002],
        extra: [0.00025899, -0.13434469, 0.87320147, 38.35125000],
    },
    PlanetElements {
        target: "URANUS BARYCENTER",
        base: [19.18797948, 0.04685740, 0.77298127, 314.20276625, 172.43404441, 73.96250215],
        rates: [-0.00020455, -0.00001550, -0.00180155, 428.49512595, 0.09266985, 0.05739699],
        extra: [0.00058331, -0.97731848, 0.17689245, 7.67025000],
    },
    PlanetElements {
        target: "NEPTUNE BARYCENTER",
        base: [30.06952752, 0.00895439, 1.77005520, 304.22289287, 46.68158724, 131.78635853],
        rates: [0.00006447, 0.00000818, 0.00022400, 218.46515314, 0.01009938, -0.00606302],
        extra: [-0.00041348, 0.68346318, -0.10162547, 7.67025000],
    },
    PlanetElements {
        target: "PLUTO BARYCENTER",
        base: [39.48686035, 0.24885238, 17.14104260, 238.96535011, 224.09702598, 110.30167986],
        rates: [0.00449751, 0.00006016, 0.00000501, 145.18042903, -0.00968827, -0.00809981],
        extra: [-0.01262724, 0.0, 0.0, 0.0],
    },
];

/// Solve Kepler's equation `M = E - e sin E` by Newton–Raphson.
pub fn solve_kepler(mean_anomaly: f64, eccentricity: f64) -> f64 {
    let m = mean_anomaly.rem_euclid(TAU);
    let mut ea = if eccentricity < 0.8 { m } else { std::f64::consts::PI };

    for _ in 0..50 {
        let delta = (ea - eccentricity * ea.sin() - m) / (1.0 - eccentricity * ea.cos());
        ea -= delta;
        if delta.abs() < 1e-13 {
            break;
        }
    }
    ea
}

impl PlanetElements {
    /// Heliocentric ecliptic position in AU, `t` in Julian centuries past J2000.
    fn position_au(&self, t: f64) -> Vector3<f64> {
        let el: [f64; 6] = std::array::from_fn(|i| self.base[i] + self.rates[i] * t);
        // Linear rates drift far outside the fit interval; keep the orbit elliptic.
        let (a, e) = (el[0], el[1].clamp(0.0, 0.99));
        let inclination = el[2].to_radians();
        let mean_longitude = el[3];
        let long_perihelion = el[4];
        let long_node = el[5];

        let [b, c, s, f] = self.extra;
        let ft = (f * t).to_radians();
        let mean_anomaly_deg =
            mean_longitude - long_perihelion + b * t * t + c * ft.cos() + s * ft.sin();
        let arg_perihelion = (long_perihelion - long_node).to_radians();
        let node = long_node.to_radians();

        let ea = solve_kepler(mean_anomaly_deg.to_radians(), e);
        let perifocal = Vector3::new(a * (ea.cos() - e), a * (1.0 - e * e).sqrt() * ea.sin(), 0.0);

        let (sw, cw) = arg_perihelion.sin_cos();
        let (so, co) = node.sin_cos();
        let (si, ci) = inclination.sin_cos();
        let rotation = Matrix3::new(
            cw * co - sw * so * ci,
            -sw * co - cw * so * ci,
            0.0,
            cw * so + sw * co * ci,
            -sw * so + cw * co * ci,
            0.0,
            sw * si,
            cw * si,
            0.0,
        );

        rotation * perifocal
    }
}

/// Mean-element evaluator for the nine planetary barycentres.
#[derive(Debug, Clone)]
pub struct MeanElementsEvaluator {
    au_km: f64,
    coverage: Option<Coverage>,
}

impl MeanElementsEvaluator {
    pub fn new(constants: &PhysicalConstants) -> Self {
        Self {
            au_km: constants.au_km,
            coverage: None,
        }
    }

    /// Refuse queries outside `coverage`, the way a loaded kernel would.
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

    fn position_km(elements: &PlanetElements, au_km: f64, et: EphemerisTime) -> Vector3<f64> {
        let centuries = et.days_since_j2000() / DAYS_PER_CENTURY;
        elements.position_au(centuries) * au_km
    }
}

impl EphemerisEvaluator for MeanElementsEvaluator {
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
        if observer != SUN_OBSERVER {
            return Err(Self::unavailable(
                target,
                et,
                format!("observer {observer} not supported"),
            ));
        }
        if aberration != AberrationCorrection::None {
            return Err(Self::unavailable(
                target,
                et,
                format!("aberration correction {aberration} not supported"),
            ));
        }
        if !et.seconds().is_finite() {
            return Err(Self::unavailable(target, et, "non-finite epoch"));
        }
        if let Some(coverage) = &self.coverage {
            if !coverage.contains(et) {
                return Err(Self::unavailable(target, et, "epoch outside loaded coverage"));
            }
        }

        let elements = PLANETS
            .iter()
            .find(|p| p.target.eq_ignore_ascii_case(target))
            .ok_or_else(|| Self::unavailable(target, et, "no elements for target"))?;

        let h = DIFFERENCE_STEP_SECONDS;
        let position_km = Self::position_km(elements, self.au_km, et);
        let ahead = Self::position_km(elements, self.au_km, EphemerisTime::new(et.seconds() + h));
        let behind = Self::position_km(elements, self.au_km, EphemerisTime::new(et.seconds() - h));

        Ok(RawState {
            position_km,
            velocity_km_s: (ahead - behind) / (2.0 * h),
        })
    }

    fn describe(&self) -> String {
        "approximate mean Keplerian elements".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator() -> MeanElementsEvaluator {
        MeanElementsEvaluator::new(&PhysicalConstants::default())
    }

    fn state(target: &str, et: f64) -> RawState {
        evaluator()
            .evaluate(
                target,
                EphemerisTime::new(et),
                ECLIPTIC_FRAME,
                AberrationCorrection::None,
                SUN_OBSERVER,
            )
            .unwrap()
    }

    #[test]
    fn test_kepler_solution_satisfies_equation() {
        for &e in &[0.0, 0.0167, 0.2056, 0.6, 0.95] {
            for k in 0..24 {
                let m = k as f64 * TAU / 24.0;
                let ea = solve_kepler(m, e);
                let residual = (ea - e * ea.sin() - m).rem_euclid(TAU);
                assert!(residual < 1e-10 || (TAU - residual) < 1e-10, "e={e} m={m}");
            }
        }
    }

    #[test]
    fn test_distances_stay_near_semi_major_axes() {
        let au = PhysicalConstants::default().au_km;
        for p in PLANETS.iter() {
            let a = p.base[0];
            let e = p.base[1];
            for days in [-1_000_000.0, -36_525.0, 0.0, 12_345.0, 1_000_000.0] {
                let r = state(p.target, days * 86_400.0).position_km.norm() / au;
                assert!(r > a * (1.0 - e) * 0.95 && r < a * (1.0 + e) * 1.05, "{} {r}", p.target);
            }
        }
    }

    #[test]
    fn test_earth_speed_near_one_degree_per_day() {
        let s = state("EARTH BARYCENTER", 0.0);
        let speed_km_s = s.velocity_km_s.norm();
        assert!((speed_km_s - 29.8).abs() < 0.7, "got {speed_km_s}");
    }

    #[test]
    fn test_earth_at_j2000_is_opposite_the_sun_longitude() {
        // At J2000 the Sun's ecliptic longitude is about 280°, so Earth sits near 100°.
        let p = state("EARTH BARYCENTER", 0.0).position_km;
        let lon = p.y.atan2(p.x).to_degrees().rem_euclid(360.0);
        assert!((lon - 100.4).abs() < 1.0, "got {lon}");
    }

    #[test]
    fn test_rejects_unknown_target_frame_and_observer() {
        let ev = evaluator();
        let et = EphemerisTime::new(0.0);
        for (target, frame, observer) in [
            ("VULCAN BARYCENTER", ECLIPTIC_FRAME, SUN_OBSERVER),
            ("MARS BARYCENTER", "J2000", SUN_OBSERVER),
            ("MARS BARYCENTER", ECLIPTIC_FRAME, "EARTH"),
        ] {
            assert!(matches!(
                ev.evaluate(target, et, frame, AberrationCorrection::None, observer),
                Err(PipelineError::EphemerisUnavailable { .. })
            ));
        }
        assert!(ev
            .evaluate(
                "MARS BARYCENTER",
                et,
                ECLIPTIC_FRAME,
                AberrationCorrection::LightTime,
                SUN_OBSERVER
            )
            .is_err());
    }

    #[test]
    fn test_coverage_is_enforced() {
        let ev = evaluator().with_coverage(Coverage {
            start: EphemerisTime::new(-1.0e9),
            end: EphemerisTime::new(1.0e9),
        });
        let inside = ev.evaluate(
            "MARS BARYCENTER",
            EphemerisTime::new(0.0),
            ECLIPTIC_FRAME,
            AberrationCorrection::None,
            SUN_OBSERVER,
        );
        assert!(inside.is_ok());
        let outside = ev.evaluate(
            "MARS BARYCENTER",
            EphemerisTime::new(2.0e9),
            ECLIPTIC_FRAME,
            AberrationCorrection::None,
            SUN_OBSERVER,
        );
        assert!(matches!(outside, Err(PipelineError::EphemerisUnavailable { .. })));
    }
}
