//! Streaming pipeline: ephemeris sampling into batched storage writes, plus
//! the day-by-day solar-activity backfill.

pub mod batcher;
pub mod report;
pub mod solar;

pub use batcher::{BatcherOptions, BatcherState, CancelHandle, StreamingBatcher};
pub use report::{RunOutcome, RunReport, SkippedStep};
pub use solar::{backfill_solar_activity, SolarBackfillReport};
