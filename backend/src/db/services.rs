//! Storage-agnostic loading operations.
//!
//! These work with any [`FullRepository`] and hold the rules that must not
//! depend on the backend: reference rows are upserted, static observation
//! tables are loaded once and skipped when already populated.

use log::{info, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::repository::{FullRepository, RepositoryResult};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{Body, DatasetKind};
use crate::solar::ingest::{parse_flux_table, parse_sunspot_csv, SkippedLine};

/// Rows per insert call when loading observation files.
const INGEST_CHUNK_SIZE: usize = 1000;

/// Result of loading a static observation file.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// The target table already had rows; the file was not read.
    AlreadyPopulated { kind: DatasetKind, rows: u64 },
    Loaded {
        kind: DatasetKind,
        rows_parsed: usize,
        rows_written: usize,
        skipped: Vec<SkippedLine>,
    },
}

pub async fn health_check<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

/// Upsert the reference rows of `bodies`. Returns the number of new rows.
pub async fn ensure_bodies<R: FullRepository + ?Sized>(
    repo: &R,
    bodies: &[Body],
) -> PipelineResult<usize> {
    let inserted = repo
        .insert_bodies(bodies)
        .await
        .map_err(|e| PipelineError::from_repository(e, bodies.len()))?;
    if inserted > 0 {
        info!("Inserted {} body reference rows", inserted);
    }
    Ok(inserted)
}

async fn populated<R: FullRepository + ?Sized>(
    repo: &R,
    kind: DatasetKind,
) -> PipelineResult<Option<u64>> {
    let rows = repo
        .row_count(kind)
        .await
        .map_err(|e| PipelineError::from_repository(e, 0))?;
    if rows > 0 {
        info!("Skipping load of {}: already holds {} rows", kind, rows);
        return Ok(Some(rows));
    }
    Ok(None)
}

fn open(path: &Path) -> PipelineResult<BufReader<File>> {
    let file = File::open(path).map_err(|e| {
        PipelineError::Ingestion(format!("cannot open {}: {}", path.display(), e))
    })?;
    Ok(BufReader::new(file))
}

/// Load a Penticton flux table into `uv_flux_data` unless it is populated.
pub async fn ingest_flux_table<R: FullRepository + ?Sized>(
    repo: &R,
    path: &Path,
) -> PipelineResult<IngestOutcome> {
    let kind = DatasetKind::UvFlux;
    if let Some(rows) = populated(repo, kind).await? {
        return Ok(IngestOutcome::AlreadyPopulated { kind, rows });
    }

    info!("Ingesting flux table {}", path.display());
    let report = parse_flux_table(open(path)?)?;

    let mut rows_written = 0;
    for chunk in report.rows.chunks(INGEST_CHUNK_SIZE) {
        rows_written += repo
            .insert_flux_observations(chunk)
            .await
            .map_err(|e| PipelineError::from_repository(e, chunk.len()))?;
    }

    finish(kind, report.rows.len(), rows_written, report.skipped)
}

/// Load the daily sunspot CSV into `sunspot_observations` unless it is populated.
pub async fn ingest_sunspots<R: FullRepository + ?Sized>(
    repo: &R,
    path: &Path,
) -> PipelineResult<IngestOutcome> {
    let kind = DatasetKind::Sunspots;
    if let Some(rows) = populated(repo, kind).await? {
        return Ok(IngestOutcome::AlreadyPopulated { kind, rows });
    }

    info!("Ingesting sunspot series {}", path.display());
    let report = parse_sunspot_csv(open(path)?)?;

    let mut rows_written = 0;
    for chunk in report.rows.chunks(INGEST_CHUNK_SIZE) {
        rows_written += repo
            .insert_sunspot_observations(chunk)
            .await
            .map_err(|e| PipelineError::from_repository(e, chunk.len()))?;
    }

    finish(kind, report.rows.len(), rows_written, report.skipped)
}

fn finish(
    kind: DatasetKind,
    rows_parsed: usize,
    rows_written: usize,
    skipped: Vec<SkippedLine>,
) -> PipelineResult<IngestOutcome> {
    if !skipped.is_empty() {
        warn!("{}: {} malformed lines skipped", kind, skipped.len());
    }
    info!("{}: {} rows parsed, {} written", kind, rows_parsed, rows_written);
    Ok(IngestOutcome::Loaded {
        kind,
        rows_parsed,
        rows_written,
        skipped,
    })
}
