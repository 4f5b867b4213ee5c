//! Repository trait definitions for the persistence gateway.
//!
//! Storage is split across two focused traits:
//!
//! - [`ephemeris`]: body reference rows, ephemeris batches and stream cursors
//! - [`solar`]: modelled and observed solar-activity series
//!
//! Functions that need both use the [`FullRepository`] bound:
//!
//! ```ignore
//! async fn load<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<()> {
//!     repo.insert_bodies(&bodies).await?;
//!     repo.insert_solar_samples(&samples).await?;
//!     Ok(())
//! }
//! ```

pub mod ephemeris;
pub mod error;
pub mod solar;

pub use ephemeris::EphemerisRepository;
pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use solar::SolarActivityRepository;

/// Composite bound for a complete repository implementation.
pub trait FullRepository: EphemerisRepository + SolarActivityRepository {}

impl<T> FullRepository for T where T: EphemerisRepository + SolarActivityRepository {}
