//! Daily solar-activity backfill.

use chrono::NaiveDate;
use rand::Rng;

use super::batcher::CancelHandle;
use crate::db::repository::SolarActivityRepository;
use crate::error::{PipelineError, PipelineResult};
use crate::models::SolarActivitySample;
use crate::solar::SolarActivityModel;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolarBackfillReport {
    pub days: usize,
    pub rows_written: usize,
    pub batches: usize,
    pub cancelled: bool,
}

/// Model every day in `[from, to]` and persist the samples in batches.
///
/// Days already present are left untouched by the repository, so a rerun over
/// the same span only fills gaps.
pub async fn backfill_solar_activity<R, G>(
    repo: &R,
    model: &SolarActivityModel,
    from: NaiveDate,
    to: NaiveDate,
    batch_size: usize,
    rng: &mut G,
    cancel: &CancelHandle,
) -> PipelineResult<SolarBackfillReport>
where
    R: SolarActivityRepository + ?Sized,
    G: Rng + ?Sized,
{
    if to < from {
        return Err(PipelineError::Configuration(format!(
            "solar backfill ends ({to}) before it starts ({from})"
        )));
    }
    if batch_size == 0 {
        return Err(PipelineError::Configuration(
            "batch size must be positive".to_string(),
        ));
    }

    log::info!("Backfilling solar activity {} .. {}", from, to);

    let mut report = SolarBackfillReport::default();
    let mut pending: Vec<SolarActivitySample> = Vec::with_capacity(batch_size);

    for date in from.iter_days().take_while(|d| *d <= to) {
        if cancel.is_cancelled() {
            log::warn!("Solar backfill cancelled before {}", date);
            report.cancelled = true;
            break;
        }

        pending.push(model.sample(date, rng)?);
        report.days += 1;

        if pending.len() == batch_size {
            write(repo, &mut pending, &mut report).await?;
        }
    }
    write(repo, &mut pending, &mut report).await?;

    log::info!(
        "Solar backfill: {} days modelled, {} rows written in {} batches",
        report.days,
        report.rows_written,
        report.batches
    );
    Ok(report)
}

async fn write<R: SolarActivityRepository + ?Sized>(
    repo: &R,
    pending: &mut Vec<SolarActivitySample>,
    report: &mut SolarBackfillReport,
) -> PipelineResult<()> {
    if pending.is_empty() {
        return Ok(());
    }
    let written = repo
        .insert_solar_samples(pending)
        .await
        .map_err(|e| PipelineError::from_repository(e, pending.len()))?;
    report.rows_written += written;
    report.batches += 1;
    pending.clear();
    Ok(())
}
