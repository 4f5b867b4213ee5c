//! Persistence gateway for ephemeris and solar-activity data.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Pipeline / loader binary                               │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services.rs)                            │
//! │  - body upserts, load-once observation tables           │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/)                        │
//! │  - EphemerisRepository, SolarActivityRepository         │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴────────────────┐
//! ┌───▼──────────────────┐  ┌─────────▼──────────────┐
//! │ Postgres (Diesel)    │  │ Local (in-memory)      │
//! └──────────────────────┘  └────────────────────────┘
//! ```

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod checksum;
pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod services;


// Postgres config is colocated with the repository implementation.
#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::{PoolStats, PostgresConfig};
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone, Default)]
pub struct PostgresConfig {
    _private: (),
}

pub use checksum::{calculate_checksum, run_key};
pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    EphemerisRepository, ErrorContext, FullRepository, RepositoryError, RepositoryResult,
    SolarActivityRepository,
};
pub use services::{ensure_bodies, health_check, ingest_flux_table, ingest_sunspots, IngestOutcome};
