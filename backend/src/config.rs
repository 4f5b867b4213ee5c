//! Application configuration (`solstream.toml`).
//!
//! One file carries every section. The storage layer reads `[repository]` and
//! `[postgres]` on its own; this module adds the pipeline, ephemeris,
//! constants and space-weather tables on top.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::constants::PhysicalConstants;
use crate::db::repo_config::{
    default_search_paths, RepositoryConfig, RepositorySettings, PostgresSettings,
    CONFIG_FILE_NAME,
};
use crate::ephemeris::{Coverage, EphemerisEvaluator, MeanElementsEvaluator};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{default_catalog, resolve_bodies, Body};
use crate::pipeline::BatcherOptions;
use crate::space_weather::{DonkiClient, DEFAULT_BASE_URL};
use crate::time;

/// Environment variable overriding `[space_weather] api_key`.
pub const API_KEY_ENV: &str = "NASA_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub postgres: PostgresSettings,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub ephemeris: EphemerisSettings,
    #[serde(default)]
    pub constants: PhysicalConstants,
    #[serde(default)]
    pub space_weather: SpaceWeatherSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_step_days")]
    pub step_days: f64,
    #[serde(default = "default_sampling_concurrency")]
    pub sampling_concurrency: usize,
    /// Body names; empty selects the full catalogue.
    #[serde(default)]
    pub bodies: Vec<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            step_days: default_step_days(),
            sampling_concurrency: default_sampling_concurrency(),
            bodies: Vec::new(),
        }
    }
}

fn default_batch_size() -> usize {
    1000
}

fn default_step_days() -> f64 {
    1.0
}

fn default_sampling_concurrency() -> usize {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EphemerisSettings {
    /// SPK kernels; empty selects the mean-elements evaluator.
    #[serde(default)]
    pub kernels: Vec<PathBuf>,
    #[serde(default = "default_coverage_start")]
    pub coverage_start: String,
    #[serde(default = "default_coverage_end")]
    pub coverage_end: String,
}

impl Default for EphemerisSettings {
    fn default() -> Self {
        Self {
            kernels: Vec::new(),
            coverage_start: default_coverage_start(),
            coverage_end: default_coverage_end(),
        }
    }
}

fn default_coverage_start() -> String {
    "01 JAN 13200 B.C.".to_string()
}

fn default_coverage_end() -> String {
    "31 DEC 17191 A.D.".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceWeatherSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for SpaceWeatherSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> PipelineResult<Self> {
        toml::from_str(content)
            .map_err(|e| PipelineError::Configuration(format!("invalid configuration: {}", e)))
    }

    /// Explicit path, else the first default location found, else defaults.
    pub fn load(path: Option<&Path>) -> PipelineResult<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match default_search_paths().into_iter().find(|p| p.exists()) {
            Some(found) => {
                log::info!("Using configuration {}", found.display());
                Self::from_file(found)
            }
            None => {
                log::info!("No {} found, using defaults", CONFIG_FILE_NAME);
                Ok(Self::default())
            }
        }
    }

    /// Storage sections, for the repository factory.
    pub fn repository_config(&self) -> RepositoryConfig {
        RepositoryConfig {
            repository: self.repository.clone(),
            postgres: self.postgres.clone(),
        }
    }

    pub fn constants(&self) -> Arc<PhysicalConstants> {
        Arc::new(self.constants.clone())
    }

    pub fn bodies(&self) -> PipelineResult<Vec<Body>> {
        resolve_bodies(&default_catalog(), &self.pipeline.bodies).map_err(|unknown| {
            PipelineError::Configuration(format!("unknown bodies: {}", unknown.join(", ")))
        })
    }

    pub fn batcher_options(&self) -> BatcherOptions {
        BatcherOptions {
            batch_size: self.pipeline.batch_size,
            sampling_concurrency: self.pipeline.sampling_concurrency.max(1),
        }
    }

    /// Coverage window from `coverage_start` through the end of `coverage_end`.
    pub fn coverage(&self) -> PipelineResult<Coverage> {
        let start = time::parse_date_argument(&self.ephemeris.coverage_start)?;
        let end = time::parse_date_argument(&self.ephemeris.coverage_end)?;
        let coverage = Coverage {
            start: time::to_ephemeris_time(&start)?,
            end: time::to_ephemeris_time(&end)?.offset_days(1.0),
        };
        if coverage.end <= coverage.start {
            return Err(PipelineError::Configuration(format!(
                "ephemeris coverage ends ({end}) before it starts ({start})"
            )));
        }
        Ok(coverage)
    }

    /// The evaluator selected by `[ephemeris]`.
    pub fn evaluator(&self, bodies: &[Body]) -> PipelineResult<Arc<dyn EphemerisEvaluator>> {
        let coverage = self.coverage()?;

        if self.ephemeris.kernels.is_empty() {
            return Ok(Arc::new(
                MeanElementsEvaluator::new(&self.constants).with_coverage(coverage),
            ));
        }

        #[cfg(feature = "spice-kernels")]
        {
            let evaluator = crate::ephemeris::kernel::KernelEvaluator::load(
                &self.ephemeris.kernels,
                bodies,
            )?
            .with_coverage(coverage);
            Ok(Arc::new(evaluator))
        }

        #[cfg(not(feature = "spice-kernels"))]
        {
            let _ = bodies;
            Err(PipelineError::Configuration(
                "kernels configured but the spice-kernels feature is not enabled".to_string(),
            ))
        }
    }

    /// API key from `NASA_API_KEY`, else the file.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.space_weather.api_key.clone())
    }

    pub fn donki_client(&self) -> PipelineResult<DonkiClient> {
        DonkiClient::new(self.space_weather.base_url.clone(), self.api_key())
    }
}
