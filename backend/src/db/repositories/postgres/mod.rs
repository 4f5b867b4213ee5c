//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::dsl::count_star;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel::upsert::excluded;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use nalgebra::Vector3;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task;

use crate::db::repository::{
    EphemerisRepository, ErrorContext, RepositoryError, RepositoryResult, SolarActivityRepository,
};
use crate::models::{
    et_key, Body, DatasetKind, EphemerisRecord, EphemerisTime, FluxObservation,
    SolarActivitySample, StreamCursor, SunspotObservation,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Rows per INSERT statement, well under the 65535 bind-parameter limit.
const INSERT_CHUNK_SIZE: usize = 1000;

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub database_url: String,
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub connection_timeout_sec: u64,
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    pub connections_in_use: u32,
    pub idle_connections: u32,
    pub total_connections: u32,
    pub max_size: u32,
    pub total_queries: u64,
    pub failed_queries: u64,
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    total_queries: Arc<AtomicU64>,
    failed_queries: Arc<AtomicU64>,
    retried_operations: Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
                RepositoryError::internal_with_context(
                    format!("Migration failed: {}", e),
                    ErrorContext::new("run_migrations"),
                )
            })?;
        }
        log::info!(
            "Connected to Postgres (pool max={}, retries={})",
            config.max_pool_size,
            config.max_retries
        );

        Ok(Self {
            pool,
            config,
            total_queries: Arc::new(AtomicU64::new(0)),
            failed_queries: Arc::new(AtomicU64::new(0)),
            retried_operations: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run `f` on a pooled connection on the blocking pool, retrying
    /// retryable failures with exponential back-off.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    log::warn!(
                        "Retrying database operation (attempt {}/{}) after {:?}",
                        attempt + 1,
                        max_retries + 1,
                        retry_delay
                    );
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1)),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }

    /// Returns (is_healthy, latency_ms, error_message).
    pub async fn health_check_detailed(&self) -> (bool, Option<u64>, Option<String>) {
        let start = Instant::now();
        let result = self.health_check().await;
        let latency = Some(start.elapsed().as_millis() as u64);
        match result {
            Ok(true) => (true, latency, None),
            Ok(false) => (false, latency, Some("Health check returned false".to_string())),
            Err(e) => (false, latency, Some(e.to_string())),
        }
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn planet_row(body: &Body) -> RepositoryResult<NewPlanetRow> {
    let atmosphere = serde_json::to_value(&body.profile.atmosphere).map_err(|e| {
        RepositoryError::internal(format!("Failed to encode atmosphere of {}: {e}", body.name))
    })?;
    Ok(NewPlanetRow {
        name: body.name.clone(),
        spice_target: body.spice_target.clone(),
        naif_id: body.naif_id,
        mean_distance_au: body.profile.mean_distance_au,
        gravity_g: body.profile.gravity_g,
        bond_albedo: body.profile.bond_albedo,
        atmosphere,
    })
}

fn ephemeris_row(record: &EphemerisRecord) -> NewEphemerisRow {
    NewEphemerisRow {
        planet: record.body.clone(),
        et: record.time.et.seconds(),
        et_ms: et_key(record.time.et),
        date: record.time.label.to_string(),
        x: record.position.x,
        y: record.position.y,
        z: record.position.z,
        vx: record.velocity.x,
        vy: record.velocity.y,
        vz: record.velocity.z,
        distance_au: record.distance_au,
        velocity_magnitude: record.velocity_magnitude,
        orbital_angle_deg: record.orbital_angle_deg,
        radiation_level: record.radiation_level,
        equilibrium_temp_k: record.equilibrium_temp_k,
    }
}

fn row_to_record(row: EphemerisRow) -> EphemerisRecord {
    EphemerisRecord {
        body: row.planet,
        time: crate::time::time_point(EphemerisTime::new(row.et)),
        position: Vector3::new(row.x, row.y, row.z),
        velocity: Vector3::new(row.vx, row.vy, row.vz),
        distance_au: row.distance_au,
        velocity_magnitude: row.velocity_magnitude,
        orbital_angle_deg: row.orbital_angle_deg,
        radiation_level: row.radiation_level,
        equilibrium_temp_k: row.equilibrium_temp_k,
    }
}

fn cursor_row(cursor: &StreamCursor) -> StreamCursorRow {
    StreamCursorRow {
        run_key: cursor.run_key.clone(),
        last_et: cursor.last_et.seconds(),
        last_label: cursor.last_label.to_string(),
        records_written: cursor.records_written as i64,
        updated_at: Utc::now(),
    }
}

fn row_to_cursor(row: StreamCursorRow) -> StreamCursor {
    let last_et = EphemerisTime::new(row.last_et);
    StreamCursor {
        run_key: row.run_key,
        last_et,
        last_label: crate::time::to_calendar(last_et),
        records_written: row.records_written.max(0) as u64,
        updated_at: row.updated_at,
    }
}

#[async_trait]
impl EphemerisRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn insert_bodies(&self, bodies: &[Body]) -> RepositoryResult<usize> {
        let rows = bodies.iter().map(planet_row).collect::<RepositoryResult<Vec<_>>>()?;
        if rows.is_empty() {
            return Ok(0);
        }
        self.with_conn(move |conn| {
            diesel::insert_into(planets::table)
                .values(&rows)
                .on_conflict(planets::name)
                .do_nothing()
                .execute(conn)
                .map_err(|e| map_diesel_error(e).with_operation("insert_bodies"))
        })
        .await
    }

    async fn list_bodies(&self) -> RepositoryResult<Vec<String>> {
        self.with_conn(|conn| {
            planets::table
                .select(planets::name)
                .order(planets::name.asc())
                .load::<String>(conn)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn insert_batch(
        &self,
        records: &[EphemerisRecord],
        cursor: Option<&StreamCursor>,
    ) -> RepositoryResult<usize> {
        let rows: Vec<NewEphemerisRow> = records.iter().map(ephemeris_row).collect();
        let cursor = cursor.map(cursor_row);

        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let mut written = 0;
                for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
                    written += diesel::insert_into(ephemeris_data::table)
                        .values(chunk)
                        .on_conflict((ephemeris_data::planet, ephemeris_data::et_ms))
                        .do_nothing()
                        .execute(tx)
                        .map_err(map_diesel_error)?;
                }

                if let Some(cursor) = &cursor {
                    diesel::insert_into(stream_cursors::table)
                        .values(cursor)
                        .on_conflict(stream_cursors::run_key)
                        .do_update()
                        .set((
                            stream_cursors::last_et.eq(excluded(stream_cursors::last_et)),
                            stream_cursors::last_label.eq(excluded(stream_cursors::last_label)),
                            stream_cursors::records_written
                                .eq(excluded(stream_cursors::records_written)),
                            stream_cursors::updated_at.eq(excluded(stream_cursors::updated_at)),
                        ))
                        .execute(tx)
                        .map_err(map_diesel_error)?;
                }

                Ok(written)
            })
            .map_err(|e| e.with_operation("insert_batch"))
        })
        .await
    }

    async fn load_cursor(&self, run_key: &str) -> RepositoryResult<Option<StreamCursor>> {
        let run_key = run_key.to_string();
        self.with_conn(move |conn| {
            stream_cursors::table
                .filter(stream_cursors::run_key.eq(&run_key))
                .select(StreamCursorRow::as_select())
                .first::<StreamCursorRow>(conn)
                .optional()
                .map(|row| row.map(row_to_cursor))
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn fetch_records(
        &self,
        body: &str,
        from: EphemerisTime,
        to: EphemerisTime,
    ) -> RepositoryResult<Vec<EphemerisRecord>> {
        let body = body.to_string();
        let (lo, hi) = (et_key(from), et_key(to));
        self.with_conn(move |conn| {
            let rows = ephemeris_data::table
                .filter(ephemeris_data::planet.eq(&body))
                .filter(ephemeris_data::et_ms.between(lo, hi))
                .order(ephemeris_data::et_ms.asc())
                .select(EphemerisRow::as_select())
                .load::<EphemerisRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(row_to_record).collect())
        })
        .await
    }

    async fn row_count(&self, kind: DatasetKind) -> RepositoryResult<u64> {
        self.with_conn(move |conn| {
            let count: i64 = match kind {
                DatasetKind::Bodies => planets::table.select(count_star()).first::<i64>(conn),
                DatasetKind::Ephemeris => ephemeris_data::table.select(count_star()).first::<i64>(conn),
                DatasetKind::SolarActivity => {
                    solar_activity::table.select(count_star()).first::<i64>(conn)
                }
                DatasetKind::UvFlux => uv_flux_data::table.select(count_star()).first::<i64>(conn),
                DatasetKind::Sunspots => {
                    sunspot_observations::table.select(count_star()).first::<i64>(conn)
                }
            }
            .map_err(|e| {
                map_diesel_error(e).with_operation(format!("row_count({})", kind.table_name()))
            })?;
            Ok(count.max(0) as u64)
        })
        .await
    }
}

#[async_trait]
impl SolarActivityRepository for PostgresRepository {
    async fn insert_solar_samples(&self, samples: &[SolarActivitySample]) -> RepositoryResult<usize> {
        let rows: Vec<NewSolarActivityRow> = samples
            .iter()
            .map(|s| NewSolarActivityRow {
                date: s.date,
                sunspot_number: s.sunspot_number,
                uv_flux: s.uv_flux,
                cosmic_flux: s.cosmic_flux,
                solar_flux: s.solar_flux,
            })
            .collect();

        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let mut written = 0;
                for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
                    written += diesel::insert_into(solar_activity::table)
                        .values(chunk)
                        .on_conflict(solar_activity::date)
                        .do_nothing()
                        .execute(tx)
                        .map_err(map_diesel_error)?;
                }
                Ok(written)
            })
        })
        .await
    }

    async fn insert_flux_observations(&self, rows: &[FluxObservation]) -> RepositoryResult<usize> {
        let rows: Vec<NewFluxRow> = rows
            .iter()
            .map(|r| NewFluxRow {
                obs_date: r.date,
                obs_time: r.time,
                julian_date: r.julian_date,
                carrington_rotation: r.carrington_rotation,
                observed_flux: r.observed_flux,
                adjusted_flux: r.adjusted_flux,
                ursi_flux: r.ursi_flux,
            })
            .collect();

        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let mut written = 0;
                for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
                    written += diesel::insert_into(uv_flux_data::table)
                        .values(chunk)
                        .on_conflict((uv_flux_data::obs_date, uv_flux_data::obs_time))
                        .do_nothing()
                        .execute(tx)
                        .map_err(map_diesel_error)?;
                }
                Ok(written)
            })
        })
        .await
    }

    async fn insert_sunspot_observations(
        &self,
        rows: &[SunspotObservation],
    ) -> RepositoryResult<usize> {
        let rows: Vec<NewSunspotRow> = rows
            .iter()
            .map(|r| NewSunspotRow {
                obs_date: r.date,
                decimal_year: r.decimal_year,
                sunspot_number: r.sunspot_number,
                std_dev: r.std_dev,
                observations: r.observations,
                definitive: r.definitive,
            })
            .collect();

        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let mut written = 0;
                for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
                    written += diesel::insert_into(sunspot_observations::table)
                        .values(chunk)
                        .on_conflict(sunspot_observations::obs_date)
                        .do_nothing()
                        .execute(tx)
                        .map_err(map_diesel_error)?;
                }
                Ok(written)
            })
        })
        .await
    }

    async fn fetch_solar_samples(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<SolarActivitySample>> {
        self.with_conn(move |conn| {
            let rows = solar_activity::table
                .filter(solar_activity::date.between(from, to))
                .order(solar_activity::date.asc())
                .select(SolarActivityRow::as_select())
                .load::<SolarActivityRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows
                .into_iter()
                .map(|r| SolarActivitySample {
                    date: r.date,
                    sunspot_number: r.sunspot_number,
                    uv_flux: r.uv_flux,
                    cosmic_flux: r.cosmic_flux,
                    solar_flux: r.solar_flux,
                })
                .collect())
        })
        .await
    }
}
