//! Run reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::CalendarLabel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Running,
    Completed,
    Cancelled,
    /// Aborted by an unrecovered error.
    Failed { error: String },
}

/// A (body, step) pair that produced no record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedStep {
    pub body: String,
    pub label: CalendarLabel,
    pub reason: String,
}

/// What a streaming run did. Partial runs are reported, not hidden.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub run_key: String,
    pub outcome: RunOutcome,
    /// Records accepted by storage in this invocation.
    pub records_flushed: u64,
    /// Rows actually new in storage; lower than `records_flushed` when a
    /// resumed step is re-emitted.
    pub rows_written: u64,
    pub batches_flushed: usize,
    pub steps_processed: u64,
    pub skipped: Vec<SkippedStep>,
    pub resumed_from: Option<CalendarLabel>,
    pub last_committed: Option<CalendarLabel>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    pub fn new(run_key: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            run_key: run_key.into(),
            outcome: RunOutcome::Running,
            records_flushed: 0,
            rows_written: 0,
            batches_flushed: 0,
            steps_processed: 0,
            skipped: Vec::new(),
            resumed_from: None,
            last_committed: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn skip(&mut self, body: &str, label: CalendarLabel, reason: impl Into<String>) {
        self.skipped.push(SkippedStep {
            body: body.to_string(),
            label,
            reason: reason.into(),
        });
    }

    pub fn finish(&mut self, outcome: RunOutcome) {
        self.outcome = outcome;
        self.finished_at = Some(Utc::now());
    }

    pub fn is_complete(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = match &self.outcome {
            RunOutcome::Running => "running".to_string(),
            RunOutcome::Completed => "completed".to_string(),
            RunOutcome::Cancelled => "cancelled".to_string(),
            RunOutcome::Failed { error } => format!("failed ({error})"),
        };
        write!(
            f,
            "run {} {}: {} records in {} batches ({} new rows), {} steps, {} skipped",
            self.run_id,
            outcome,
            self.records_flushed,
            self.batches_flushed,
            self.rows_written,
            self.steps_processed,
            self.skipped.len()
        )?;
        if let Some(label) = &self.resumed_from {
            write!(f, ", resumed after {}", label)?;
        }
        if let Some(label) = &self.last_committed {
            write!(f, ", committed through {}", label)?;
        }
        Ok(())
    }
}
