//! # solstream
//!
//! Long-horizon planetary ephemerides and solar-activity proxies, streamed
//! into a time-series store.
//!
//! ## Architecture
//!
//! - [`time`]: ephemeris time ⇄ calendar labels, including B.C. dates
//! - [`ephemeris`]: orbital states from a pluggable evaluator
//! - [`metrics`]: distance, speed, orbital angle, radiation and temperature
//! - [`solar`]: cyclical sunspot / UV / cosmic-ray model and text ingestion
//! - [`pipeline`]: the streaming batcher and the solar backfill
//! - [`db`]: repository traits with PostgreSQL and in-memory backends
//! - [`space_weather`]: DONKI notification client
//! - [`config`]: `solstream.toml`

// RepositoryError carries a structured context.
#![allow(clippy::result_large_err)]

pub mod config;
pub mod constants;
pub mod db;
pub mod ephemeris;
pub mod error;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod solar;
pub mod space_weather;
pub mod time;

pub use constants::PhysicalConstants;
pub use error::{PipelineError, PipelineResult};
