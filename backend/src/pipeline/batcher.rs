//! Streaming batcher: walks a date range, samples every body at every step,
//! and flushes fixed-size batches through the repository.
//!
//! ```text
//!   Idle ──run()──▶ Streaming ──batch full──▶ Draining
//!    ▲                 │  ▲                      │
//!    │                 │  └──── flushed ─────────┘
//!    └── range done ───┘   (remainder drained first)
//! ```
//!
//! Records are appended time-major, bodies in configured order. Every flush
//! carries a cursor naming the last step whose records are all committed, so
//! a restarted run resumes one step past it.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::report::{RunOutcome, RunReport};
use crate::constants::SECONDS_PER_DAY;
use crate::db::checksum;
use crate::db::repository::EphemerisRepository;
use crate::ephemeris::OrbitalStateSampler;
use crate::error::{PipelineError, PipelineResult};
use crate::metrics;
use crate::models::{
    Batch, Body, DateRange, EphemerisRecord, EphemerisTime, StreamCursor, TimePoint,
};
use crate::time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatcherState {
    Idle,
    Streaming,
    Draining,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatcherOptions {
    /// Records per flush.
    pub batch_size: usize,
    /// Bodies sampled concurrently within a step; 1 samples inline.
    pub sampling_concurrency: usize,
}

impl Default for BatcherOptions {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            sampling_concurrency: 1,
        }
    }
}

/// Shared flag checked between steps.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

fn sample_body(
    sampler: &OrbitalStateSampler,
    body: &Body,
    time: TimePoint,
) -> PipelineResult<EphemerisRecord> {
    let state = sampler.sample(body, time.et)?;
    metrics::derive_record(sampler.constants(), body, time, &state)
}

pub struct StreamingBatcher<R: EphemerisRepository + ?Sized> {
    repo: Arc<R>,
    sampler: Arc<OrbitalStateSampler>,
    bodies: Arc<Vec<Body>>,
    options: BatcherOptions,
    state: BatcherState,
    batch: Batch<EphemerisRecord>,
    run_key: String,
    /// Last step whose records have all been appended.
    last_completed: Option<TimePoint>,
    /// Records committed under `run_key`, including earlier invocations.
    committed_records: u64,
    cancel: CancelHandle,
    report: RunReport,
}

impl<R: EphemerisRepository + ?Sized> StreamingBatcher<R> {
    pub fn new(
        repo: Arc<R>,
        sampler: Arc<OrbitalStateSampler>,
        bodies: Vec<Body>,
        options: BatcherOptions,
    ) -> PipelineResult<Self> {
        if bodies.is_empty() {
            return Err(PipelineError::Configuration(
                "streaming needs at least one body".to_string(),
            ));
        }
        if options.batch_size == 0 {
            return Err(PipelineError::Configuration(
                "batch size must be positive".to_string(),
            ));
        }

        Ok(Self {
            repo,
            sampler,
            bodies: Arc::new(bodies),
            options,
            state: BatcherState::Idle,
            batch: Batch::with_capacity(options.batch_size),
            run_key: String::new(),
            last_completed: None,
            committed_records: 0,
            cancel: CancelHandle::new(),
            report: RunReport::new(String::new()),
        })
    }

    /// Use an externally owned cancellation flag.
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn state(&self) -> BatcherState {
        self.state
    }

    /// Records buffered but not yet committed.
    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Report of the current or most recent run, including failed ones.
    pub fn last_report(&self) -> &RunReport {
        &self.report
    }

    /// Resubmit a batch retained by a failed flush. Returns the number of
    /// records committed.
    pub async fn retry_flush(&mut self) -> PipelineResult<usize> {
        let pending = self.batch.len();
        self.flush().await?;
        Ok(pending)
    }

    /// Stream `range`, resuming after the stored cursor of the same run.
    ///
    /// A batch retained by an earlier failure is flushed before anything else.
    /// On an unrecovered error the buffered records are drained when storage
    /// is still usable, and [`Self::last_report`] describes the partial run.
    pub async fn run(&mut self, range: DateRange) -> PipelineResult<RunReport> {
        range.validate()?;

        let mut resubmitted = (0u64, 0u64, 0usize);
        if !self.batch.is_empty() {
            log::info!(
                "Resubmitting {} records retained from a failed flush",
                self.batch.len()
            );
            let before = (
                self.report.records_flushed,
                self.report.rows_written,
                self.report.batches_flushed,
            );
            self.flush().await?;
            resubmitted = (
                self.report.records_flushed - before.0,
                self.report.rows_written - before.1,
                self.report.batches_flushed - before.2,
            );
        }

        let start_et = time::to_ephemeris_time(&range.start)?;
        let end_et = time::to_ephemeris_time(&range.end)?;
        let step_seconds = range.step_days * SECONDS_PER_DAY;
        let limit = end_et.seconds() + 0.5 * step_seconds;

        self.run_key = checksum::run_key(&range, &self.bodies);
        self.report = RunReport::new(self.run_key.clone());
        self.report.records_flushed = resubmitted.0;
        self.report.rows_written = resubmitted.1;
        self.report.batches_flushed = resubmitted.2;
        self.last_completed = None;
        self.committed_records = 0;

        self.repo.insert_bodies(&self.bodies).await?;

        let mut first_index = 0u64;
        if let Some(cursor) = self.repo.load_cursor(&self.run_key).await? {
            let done = ((cursor.last_et.seconds() - start_et.seconds()) / step_seconds).round();
            if done >= 0.0 {
                first_index = done as u64 + 1;
            }
            self.committed_records = cursor.records_written;
            self.last_completed = Some(TimePoint {
                et: cursor.last_et,
                label: cursor.last_label,
            });
            self.report.resumed_from = Some(cursor.last_label);
            log::info!(
                "Resuming run {} after {} ({} records already committed)",
                self.run_key,
                cursor.last_label,
                cursor.records_written
            );
        }

        log::info!(
            "Streaming {} bodies from {} to {} every {} days (batch size {})",
            self.bodies.len(),
            range.start,
            range.end,
            range.step_days,
            self.options.batch_size
        );

        self.state = BatcherState::Streaming;
        let outcome = match self.walk(start_et, first_index, limit, range.step_days).await {
            Ok(outcome) => outcome,
            Err(err) => return Err(self.abort(err).await),
        };

        if let Err(err) = self.flush().await {
            return Err(self.abort(err).await);
        }

        self.state = BatcherState::Idle;
        self.report.finish(outcome);
        log::info!("{}", self.report);
        Ok(self.report.clone())
    }

    async fn walk(
        &mut self,
        start_et: EphemerisTime,
        first_index: u64,
        limit: f64,
        step_days: f64,
    ) -> PipelineResult<RunOutcome> {
        let bodies = self.bodies.clone();
        let mut index = first_index;

        loop {
            let et = time::step_forward(start_et, index as f64 * step_days);
            if et.seconds() > limit {
                return Ok(RunOutcome::Completed);
            }
            if self.cancel.is_cancelled() {
                log::warn!(
                    "Cancellation requested, stopping before {}",
                    time::to_calendar(et)
                );
                return Ok(RunOutcome::Cancelled);
            }

            let time = time::time_point(et);
            let results = self.sample_step(time).await?;

            let mut records = Vec::with_capacity(results.len());
            for (body, result) in bodies.iter().zip(results) {
                match result {
                    Ok(record) => records.push(record),
                    Err(err) if !err.is_fatal() => {
                        log::warn!("Skipping {} at {}: {}", body.name, time.label, err);
                        self.report.skip(&body.name, time.label, err.to_string());
                    }
                    Err(err) => return Err(err),
                }
            }

            self.append_step(time, records).await?;
            self.report.steps_processed += 1;
            index += 1;
        }
    }

    /// Sample every body at one instant, in body order.
    async fn sample_step(
        &self,
        time: TimePoint,
    ) -> PipelineResult<Vec<PipelineResult<EphemerisRecord>>> {
        if self.options.sampling_concurrency <= 1 {
            return Ok(self
                .bodies
                .iter()
                .map(|body| sample_body(&self.sampler, body, time))
                .collect());
        }

        // `buffered` yields in submission order, which restores body order.
        let joined: Vec<_> = stream::iter(0..self.bodies.len())
            .map(|idx| {
                let sampler = self.sampler.clone();
                let bodies = self.bodies.clone();
                tokio::task::spawn_blocking(move || sample_body(&sampler, &bodies[idx], time))
            })
            .buffered(self.options.sampling_concurrency)
            .collect()
            .await;

        joined
            .into_iter()
            .map(|r| r.map_err(|e| PipelineError::Worker(e.to_string())))
            .collect()
    }

    async fn append_step(
        &mut self,
        time: TimePoint,
        records: Vec<EphemerisRecord>,
    ) -> PipelineResult<()> {
        if records.is_empty() {
            self.last_completed = Some(time);
            return Ok(());
        }

        let last = records.len() - 1;
        for (i, record) in records.into_iter().enumerate() {
            let mut record = record;
            while let Err(rejected) = self.batch.push(record) {
                record = rejected;
                self.flush().await?;
            }
            if i == last {
                self.last_completed = Some(time);
            }
            if self.batch.is_full() {
                self.flush().await?;
            }
        }
        Ok(())
    }

    /// Write the buffered records. On failure the batch is kept intact.
    async fn flush(&mut self) -> PipelineResult<()> {
        if self.batch.is_empty() {
            return Ok(());
        }

        let resume_state = self.state;
        self.state = BatcherState::Draining;

        let cursor = self.last_completed.map(|time| StreamCursor {
            run_key: self.run_key.clone(),
            last_et: time.et,
            last_label: time.label,
            records_written: self.committed_records + self.batch.len() as u64,
            updated_at: Utc::now(),
        });

        let result = self
            .repo
            .insert_batch(self.batch.as_slice(), cursor.as_ref())
            .await;
        self.state = resume_state;

        match result {
            Ok(written) => {
                let flushed = self.batch.len() as u64;
                self.committed_records += flushed;
                self.report.records_flushed += flushed;
                self.report.rows_written += written as u64;
                self.report.batches_flushed += 1;
                if let Some(cursor) = &cursor {
                    self.report.last_committed = Some(cursor.last_label);
                }
                log::info!(
                    "Flushed {} records ({} new), cursor at {}",
                    flushed,
                    written,
                    cursor
                        .as_ref()
                        .map(|c| c.last_label.to_string())
                        .unwrap_or_else(|| "-".to_string())
                );
                self.batch.clear();
                Ok(())
            }
            Err(err) => {
                let pending = self.batch.len();
                log::warn!("Flush of {} records failed, batch retained: {}", pending, err);
                Err(PipelineError::from_repository(err, pending))
            }
        }
    }

    async fn abort(&mut self, err: PipelineError) -> PipelineError {
        let storage_failed = matches!(
            err,
            PipelineError::PersistenceFailure { .. } | PipelineError::StorageUnavailable(_)
        );
        if !storage_failed && !self.batch.is_empty() {
            if let Err(flush_err) = self.flush().await {
                log::warn!(
                    "Could not drain {} records after failure: {}",
                    self.batch.len(),
                    flush_err
                );
            }
        }

        self.state = BatcherState::Idle;
        self.report.finish(RunOutcome::Failed {
            error: err.to_string(),
        });
        log::error!("{}", self.report);
        err
    }
}
