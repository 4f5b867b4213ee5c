#![allow(dead_code)]

use std::collections::HashSet;
use std::f64::consts::TAU;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use nalgebra::Vector3;
use solstream::constants::PhysicalConstants;
use solstream::ephemeris::{AberrationCorrection, EphemerisEvaluator, OrbitalStateSampler, RawState};
use solstream::error::{PipelineError, PipelineResult};
use solstream::models::{default_catalog, resolve_bodies, Body, CalendarLabel, EphemerisTime};
use solstream::pipeline::CancelHandle;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the variables on unwind and serialises access, since tests share
/// one process environment.
///
/// `Some(v)` sets a variable, `None` removes it.
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Deterministic evaluator: body `i` of the catalogue moves on a circle of
/// radius `i + 1` AU with a one-year period.
#[derive(Default)]
pub struct CircularEvaluator {
    au_km: f64,
    /// Targets that sit at the Sun.
    degenerate: Vec<String>,
    /// No data after this instant.
    coverage_end: Option<EphemerisTime>,
    /// Cancel after this many evaluations.
    cancel_after: Option<(usize, CancelHandle)>,
    calls: AtomicUsize,
}

impl CircularEvaluator {
    pub fn new() -> Self {
        Self {
            au_km: PhysicalConstants::default().au_km,
            ..Default::default()
        }
    }

    pub fn degenerate(mut self, target: &str) -> Self {
        self.degenerate.push(target.to_string());
        self
    }

    pub fn coverage_end(mut self, et: EphemerisTime) -> Self {
        self.coverage_end = Some(et);
        self
    }

    pub fn cancel_after(mut self, calls: usize, handle: CancelHandle) -> Self {
        self.cancel_after = Some((calls, handle));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn radius_au(target: &str) -> f64 {
        default_catalog()
            .iter()
            .position(|b| b.spice_target == target)
            .map(|i| i as f64 + 1.0)
            .unwrap_or(1.0)
    }
}

impl EphemerisEvaluator for CircularEvaluator {
    fn evaluate(
        &self,
        target: &str,
        et: EphemerisTime,
        _frame: &str,
        _aberration: AberrationCorrection,
        _observer: &str,
    ) -> PipelineResult<RawState> {
        let calls = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((limit, handle)) = &self.cancel_after {
            if calls >= *limit {
                handle.cancel();
            }
        }

        if let Some(end) = self.coverage_end {
            if et > end {
                return Err(PipelineError::EphemerisUnavailable {
                    body: target.to_string(),
                    et: et.seconds(),
                    reason: "beyond test coverage".to_string(),
                });
            }
        }

        if self.degenerate.iter().any(|t| t == target) {
            return Ok(RawState {
                position_km: Vector3::zeros(),
                velocity_km_s: Vector3::zeros(),
            });
        }

        let r_km = Self::radius_au(target) * self.au_km;
        let omega = TAU / (365.25 * 86_400.0);
        let theta = omega * et.seconds();
        Ok(RawState {
            position_km: Vector3::new(r_km * theta.cos(), r_km * theta.sin(), 0.0),
            velocity_km_s: Vector3::new(
                -r_km * omega * theta.sin(),
                r_km * omega * theta.cos(),
                0.0,
            ),
        })
    }

    fn describe(&self) -> String {
        "circular test orbits".to_string()
    }
}

pub fn sampler(evaluator: CircularEvaluator) -> Arc<OrbitalStateSampler> {
    Arc::new(OrbitalStateSampler::new(
        Arc::new(evaluator),
        Arc::new(PhysicalConstants::default()),
    ))
}

pub fn bodies(names: &[&str]) -> Vec<Body> {
    let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    resolve_bodies(&default_catalog(), &names).unwrap()
}

pub fn ad(year: u32, month: u8, day: u8) -> CalendarLabel {
    CalendarLabel::from_astronomical(year as i64, month, day)
}
