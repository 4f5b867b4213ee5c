//! In-memory local repository implementation.
//!
//! Suitable for unit tests and local runs. Everything lives behind one lock,
//! so every insert is trivially all-or-nothing.

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::db::repository::*;
use crate::models::{
    et_key, Body, DatasetKind, EphemerisRecord, EphemerisTime, FluxObservation,
    SolarActivitySample, StreamCursor, SunspotObservation,
};

/// In-memory local repository.
///
/// # Example
/// ```
/// use solstream::db::repositories::LocalRepository;
/// use solstream::db::EphemerisRepository;
/// use solstream::models::default_catalog;
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// rt.block_on(async {
///     let repo = LocalRepository::new();
///     assert_eq!(repo.insert_bodies(&default_catalog()).await.unwrap(), 9);
///     assert_eq!(repo.insert_bodies(&default_catalog()).await.unwrap(), 0);
/// });
/// ```
#[derive(Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    bodies: BTreeMap<String, Body>,

    ephemeris: Vec<EphemerisRecord>,
    ephemeris_keys: HashSet<(String, i64)>,
    cursors: HashMap<String, StreamCursor>,

    solar_samples: BTreeMap<NaiveDate, SolarActivitySample>,
    flux_observations: BTreeMap<(NaiveDate, chrono::NaiveTime), FluxObservation>,
    sunspot_observations: BTreeMap<NaiveDate, SunspotObservation>,

    // Size of every insert_batch call, in call order
    batch_sizes: Vec<usize>,

    // Failure injection
    is_healthy: bool,
    failing_inserts: usize,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            bodies: BTreeMap::new(),
            ephemeris: Vec::new(),
            ephemeris_keys: HashSet::new(),
            cursors: HashMap::new(),
            solar_samples: BTreeMap::new(),
            flux_observations: BTreeMap::new(),
            sunspot_observations: BTreeMap::new(),
            batch_sizes: Vec::new(),
            is_healthy: true,
            failing_inserts: 0,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the health status for testing connection failures.
    ///
    /// While unhealthy every write fails with a connection error.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Make the next `count` calls to `insert_batch` fail with a query error.
    pub fn fail_next_inserts(&self, count: usize) {
        self.data.write().failing_inserts = count;
    }

    /// Clear all data, keeping the health flag.
    pub fn clear(&self) {
        let mut data = self.data.write();
        let is_healthy = data.is_healthy;
        *data = LocalData {
            is_healthy,
            ..Default::default()
        };
    }

    /// Sizes of all `insert_batch` calls so far, including failed ones.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.data.read().batch_sizes.clone()
    }

    /// Every stored ephemeris record in insertion order.
    pub fn stored_records(&self) -> Vec<EphemerisRecord> {
        self.data.read().ephemeris.clone()
    }

    pub fn record_count(&self) -> usize {
        self.data.read().ephemeris.len()
    }

    fn check_health(data: &LocalData, operation: &str) -> RepositoryResult<()> {
        if !data.is_healthy {
            return Err(RepositoryError::connection_with_context(
                "Database is not healthy",
                ErrorContext::new(operation),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl EphemerisRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn insert_bodies(&self, bodies: &[Body]) -> RepositoryResult<usize> {
        let mut data = self.data.write();
        Self::check_health(&data, "insert_bodies")?;

        let mut inserted = 0;
        for body in bodies {
            if !data.bodies.contains_key(&body.name) {
                data.bodies.insert(body.name.clone(), body.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn list_bodies(&self) -> RepositoryResult<Vec<String>> {
        let data = self.data.read();
        Self::check_health(&data, "list_bodies")?;
        Ok(data.bodies.keys().cloned().collect())
    }

    async fn insert_batch(
        &self,
        records: &[EphemerisRecord],
        cursor: Option<&StreamCursor>,
    ) -> RepositoryResult<usize> {
        let mut data = self.data.write();
        data.batch_sizes.push(records.len());
        Self::check_health(&data, "insert_batch")?;

        if data.failing_inserts > 0 {
            data.failing_inserts -= 1;
            return Err(RepositoryError::query_with_context(
                "Injected insert failure",
                ErrorContext::new("insert_batch")
                    .with_entity(DatasetKind::Ephemeris.table_name())
                    .with_details(format!("rows={}", records.len())),
            ));
        }

        if let Some(missing) = records.iter().find(|r| !data.bodies.contains_key(&r.body)) {
            return Err(RepositoryError::validation(format!(
                "Unknown body '{}' in ephemeris batch",
                missing.body
            )));
        }

        let mut written = 0;
        for record in records {
            if data.ephemeris_keys.insert(record.key()) {
                data.ephemeris.push(record.clone());
                written += 1;
            }
        }

        if let Some(cursor) = cursor {
            data.cursors.insert(cursor.run_key.clone(), cursor.clone());
        }

        log::debug!(
            "Local insert_batch: {} records, {} new, cursor={:?}",
            records.len(),
            written,
            cursor.map(|c| c.last_label.to_string())
        );
        Ok(written)
    }

    async fn load_cursor(&self, run_key: &str) -> RepositoryResult<Option<StreamCursor>> {
        let data = self.data.read();
        Self::check_health(&data, "load_cursor")?;
        Ok(data.cursors.get(run_key).cloned())
    }

    async fn fetch_records(
        &self,
        body: &str,
        from: EphemerisTime,
        to: EphemerisTime,
    ) -> RepositoryResult<Vec<EphemerisRecord>> {
        let data = self.data.read();
        Self::check_health(&data, "fetch_records")?;

        let (lo, hi) = (et_key(from), et_key(to));
        let mut records: Vec<EphemerisRecord> = data
            .ephemeris
            .iter()
            .filter(|r| r.body == body)
            .filter(|r| (lo..=hi).contains(&et_key(r.time.et)))
            .cloned()
            .collect();
        records.sort_by_key(|r| et_key(r.time.et));
        Ok(records)
    }

    async fn row_count(&self, kind: DatasetKind) -> RepositoryResult<u64> {
        let data = self.data.read();
        Self::check_health(&data, "row_count")?;
        let count = match kind {
            DatasetKind::Bodies => data.bodies.len(),
            DatasetKind::Ephemeris => data.ephemeris.len(),
            DatasetKind::SolarActivity => data.solar_samples.len(),
            DatasetKind::UvFlux => data.flux_observations.len(),
            DatasetKind::Sunspots => data.sunspot_observations.len(),
        };
        Ok(count as u64)
    }
}

#[async_trait]
impl SolarActivityRepository for LocalRepository {
    async fn insert_solar_samples(&self, samples: &[SolarActivitySample]) -> RepositoryResult<usize> {
        let mut data = self.data.write();
        Self::check_health(&data, "insert_solar_samples")?;

        let before = data.solar_samples.len();
        for sample in samples {
            data.solar_samples.entry(sample.date).or_insert(*sample);
        }
        Ok(data.solar_samples.len() - before)
    }

    async fn insert_flux_observations(&self, rows: &[FluxObservation]) -> RepositoryResult<usize> {
        let mut data = self.data.write();
        Self::check_health(&data, "insert_flux_observations")?;

        let before = data.flux_observations.len();
        for row in rows {
            data.flux_observations
                .entry((row.date, row.time))
                .or_insert_with(|| row.clone());
        }
        Ok(data.flux_observations.len() - before)
    }

    async fn insert_sunspot_observations(
        &self,
        rows: &[SunspotObservation],
    ) -> RepositoryResult<usize> {
        let mut data = self.data.write();
        Self::check_health(&data, "insert_sunspot_observations")?;

        let before = data.sunspot_observations.len();
        for row in rows {
            data.sunspot_observations
                .entry(row.date)
                .or_insert_with(|| row.clone());
        }
        Ok(data.sunspot_observations.len() - before)
    }

    async fn fetch_solar_samples(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<SolarActivitySample>> {
        let data = self.data.read();
        Self::check_health(&data, "fetch_solar_samples")?;
        if from > to {
            return Ok(Vec::new());
        }
        Ok(data.solar_samples.range(from..=to).map(|(_, s)| *s).collect())
    }
}
