//! Ephemeris storage operations.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Body, DatasetKind, EphemerisRecord, EphemerisTime, StreamCursor};

/// Repository trait for body reference data and the ephemeris time series.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait EphemerisRepository: Send + Sync {
    // ==================== Health & Connection ====================

    /// Check if the storage connection is healthy.
    ///
    /// # Returns
    /// - `Ok(true)` if connection is healthy
    /// - `Ok(false)` if connection is unhealthy but no error occurred
    /// - `Err(RepositoryError)` if an error occurred during the check
    async fn health_check(&self) -> RepositoryResult<bool>;

    // ==================== Bodies ====================

    /// Upsert body reference rows.
    ///
    /// Names already present are left untouched; calling this twice with the
    /// same bodies is a no-op the second time.
    ///
    /// # Returns
    /// The number of rows actually inserted.
    async fn insert_bodies(&self, bodies: &[Body]) -> RepositoryResult<usize>;

    /// Names of all stored bodies, sorted.
    async fn list_bodies(&self) -> RepositoryResult<Vec<String>>;

    // ==================== Ephemeris ====================

    /// Insert a batch of records, all or nothing.
    ///
    /// When `cursor` is given it is upserted in the same transaction, so a
    /// committed cursor never points past uncommitted records. Records whose
    /// (body, time) key already exists are ignored.
    ///
    /// # Returns
    /// The number of new rows written.
    async fn insert_batch(
        &self,
        records: &[EphemerisRecord],
        cursor: Option<&StreamCursor>,
    ) -> RepositoryResult<usize>;

    /// Load the resume cursor of a run, if one was ever committed.
    async fn load_cursor(&self, run_key: &str) -> RepositoryResult<Option<StreamCursor>>;

    /// Records of one body with `from <= et <= to`, ordered by time.
    async fn fetch_records(
        &self,
        body: &str,
        from: EphemerisTime,
        to: EphemerisTime,
    ) -> RepositoryResult<Vec<EphemerisRecord>>;

    // ==================== Dataset probes ====================

    /// Number of rows in a dataset.
    async fn row_count(&self, kind: DatasetKind) -> RepositoryResult<u64>;

    /// Whether a dataset already holds any rows.
    async fn is_populated(&self, kind: DatasetKind) -> RepositoryResult<bool> {
        Ok(self.row_count(kind).await? > 0)
    }
}
