//! Solar-activity storage operations.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::models::{FluxObservation, SolarActivitySample, SunspotObservation};

/// Repository trait for daily solar-activity series.
///
/// All inserts are keyed on date (flux rows on date and time) and ignore
/// rows that already exist. Each returns the number of new rows.
#[async_trait]
pub trait SolarActivityRepository: Send + Sync {
    /// Store modelled daily samples.
    async fn insert_solar_samples(&self, samples: &[SolarActivitySample]) -> RepositoryResult<usize>;

    /// Store rows of the observed 10.7 cm flux table.
    async fn insert_flux_observations(&self, rows: &[FluxObservation]) -> RepositoryResult<usize>;

    /// Store rows of the observed daily sunspot series.
    async fn insert_sunspot_observations(
        &self,
        rows: &[SunspotObservation],
    ) -> RepositoryResult<usize>;

    /// Modelled samples with `from <= date <= to`, ordered by date.
    async fn fetch_solar_samples(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<SolarActivitySample>>;
}
