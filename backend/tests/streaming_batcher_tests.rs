//! Streaming batcher against the in-memory repository.

mod support;

use std::sync::Arc;

use solstream::db::repositories::LocalRepository;
use solstream::db::EphemerisRepository;
use solstream::error::PipelineError;
use solstream::models::{DateRange, DatasetKind};
use solstream::pipeline::{
    BatcherOptions, BatcherState, CancelHandle, RunOutcome, StreamingBatcher,
};
use solstream::time::to_ephemeris_time;

use support::{ad, bodies, sampler, CircularEvaluator};

fn options(batch_size: usize) -> BatcherOptions {
    BatcherOptions {
        batch_size,
        sampling_concurrency: 1,
    }
}

fn batcher(
    repo: &Arc<LocalRepository>,
    evaluator: CircularEvaluator,
    names: &[&str],
    opts: BatcherOptions,
) -> StreamingBatcher<LocalRepository> {
    StreamingBatcher::new(repo.clone(), sampler(evaluator), bodies(names), opts).unwrap()
}

fn three_days() -> DateRange {
    DateRange::new(ad(2024, 1, 1), ad(2024, 1, 3), 1.0)
}

/// (body, label) of every stored record, in storage order.
fn stored_keys(repo: &LocalRepository) -> Vec<(String, String)> {
    repo.stored_records()
        .into_iter()
        .map(|r| (r.body, r.time.label.to_string()))
        .collect()
}

#[tokio::test]
async fn test_three_days_two_bodies_flush_four_then_two() {
    let repo = Arc::new(LocalRepository::new());
    let mut b = batcher(&repo, CircularEvaluator::new(), &["Earth", "Mars"], options(4));

    let report = b.run(three_days()).await.unwrap();

    assert_eq!(repo.batch_sizes(), vec![4, 2]);
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.records_flushed, 6);
    assert_eq!(report.rows_written, 6);
    assert_eq!(report.batches_flushed, 2);
    assert_eq!(report.steps_processed, 3);
    assert_eq!(report.last_committed, Some(ad(2024, 1, 3)));
    assert_eq!(b.state(), BatcherState::Idle);
    assert_eq!(b.pending(), 0);
}

#[tokio::test]
async fn test_records_are_time_major_in_body_order() {
    let repo = Arc::new(LocalRepository::new());
    let mut b = batcher(&repo, CircularEvaluator::new(), &["Mars", "Earth"], options(4));
    b.run(three_days()).await.unwrap();

    let expected: Vec<(String, String)> = ["2024 01 01", "2024 01 02", "2024 01 03"]
        .iter()
        .flat_map(|day| {
            ["Mars", "Earth"]
                .iter()
                .map(move |body| (body.to_string(), day.to_string()))
        })
        .collect();
    assert_eq!(stored_keys(&repo), expected);
}

#[tokio::test]
async fn test_flush_count_is_ceiling_of_records_over_capacity() {
    let repo = Arc::new(LocalRepository::new());
    let mut b = batcher(
        &repo,
        CircularEvaluator::new(),
        &["Venus", "Earth", "Mars"],
        options(4),
    );
    let range = DateRange::new(ad(2024, 2, 27), ad(2024, 3, 2), 1.0);

    let report = b.run(range).await.unwrap();

    // 2024 is a leap year: Feb 27 .. Mar 2 is five days.
    assert_eq!(report.steps_processed, 5);
    assert_eq!(repo.batch_sizes(), vec![4, 4, 4, 3]);
    assert_eq!(repo.record_count(), 15);

    let labels: Vec<String> = repo
        .stored_records()
        .iter()
        .step_by(3)
        .map(|r| r.time.label.to_string())
        .collect();
    assert_eq!(
        labels,
        vec!["2024 02 27", "2024 02 28", "2024 02 29", "2024 03 01", "2024 03 02"]
    );
}

#[tokio::test]
async fn test_failed_flush_retains_batch_then_resumes() {
    let repo = Arc::new(LocalRepository::new());
    let mut b = batcher(&repo, CircularEvaluator::new(), &["Earth", "Mars"], options(4));
    repo.fail_next_inserts(1);

    let err = b.run(three_days()).await.unwrap_err();
    match err {
        PipelineError::PersistenceFailure { pending, .. } => assert_eq!(pending, 4),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(b.pending(), 4);
    assert_eq!(repo.record_count(), 0);
    assert!(matches!(b.last_report().outcome, RunOutcome::Failed { .. }));

    assert_eq!(b.retry_flush().await.unwrap(), 4);
    assert_eq!(b.pending(), 0);
    assert_eq!(repo.record_count(), 4);

    let report = b.run(three_days()).await.unwrap();
    assert_eq!(report.resumed_from, Some(ad(2024, 1, 2)));
    assert_eq!(report.records_flushed, 2);
    assert_eq!(repo.record_count(), 6);
    assert_eq!(repo.batch_sizes(), vec![4, 4, 2]);

    let mut keys = stored_keys(&repo);
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), 6);
}

#[tokio::test]
async fn test_run_resubmits_retained_batch_first() {
    let repo = Arc::new(LocalRepository::new());
    let mut b = batcher(&repo, CircularEvaluator::new(), &["Earth", "Mars"], options(4));
    repo.fail_next_inserts(1);
    assert!(b.run(three_days()).await.is_err());

    let report = b.run(three_days()).await.unwrap();
    assert!(report.is_complete());
    assert_eq!(repo.record_count(), 6);
    assert_eq!(report.records_flushed, 6);
    assert_eq!(report.rows_written, 6);
    assert_eq!(report.batches_flushed, 2);
    assert_eq!(repo.batch_sizes(), vec![4, 4, 2]);
}

#[tokio::test]
async fn test_completed_run_is_not_repeated() {
    let repo = Arc::new(LocalRepository::new());
    let mut b = batcher(&repo, CircularEvaluator::new(), &["Earth"], options(10));
    b.run(three_days()).await.unwrap();

    let again = b.run(three_days()).await.unwrap();
    assert!(again.is_complete());
    assert_eq!(again.steps_processed, 0);
    assert_eq!(again.records_flushed, 0);
    assert_eq!(repo.record_count(), 3);

    let cursor = repo.load_cursor(&again.run_key).await.unwrap().unwrap();
    assert_eq!(cursor.records_written, 3);
    assert_eq!(cursor.last_label, ad(2024, 1, 3));
}

#[tokio::test]
async fn test_cancellation_drains_partial_batch() {
    let repo = Arc::new(LocalRepository::new());
    let cancel = CancelHandle::new();
    let evaluator = CircularEvaluator::new().cancel_after(3, cancel.clone());
    let mut b = batcher(&repo, evaluator, &["Earth", "Mars"], options(1000))
        .with_cancel_handle(cancel);

    let report = b
        .run(DateRange::new(ad(2024, 1, 1), ad(2024, 1, 5), 1.0))
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Cancelled);
    assert!(!report.is_complete());
    assert_eq!(report.steps_processed, 2);
    assert_eq!(repo.batch_sizes(), vec![4]);
    assert_eq!(report.last_committed, Some(ad(2024, 1, 2)));
}

#[tokio::test]
async fn test_degenerate_body_is_skipped() {
    let repo = Arc::new(LocalRepository::new());
    let evaluator = CircularEvaluator::new().degenerate("EARTH BARYCENTER");
    let mut b = batcher(&repo, evaluator, &["Earth", "Mars"], options(1000));

    let report = b.run(three_days()).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.skipped.len(), 3);
    assert!(report.skipped.iter().all(|s| s.body == "Earth"));
    assert_eq!(repo.record_count(), 3);
    assert!(repo.stored_records().iter().all(|r| r.body == "Mars"));
}

#[tokio::test]
async fn test_ephemeris_gap_drains_then_fails() {
    let repo = Arc::new(LocalRepository::new());
    let end = to_ephemeris_time(&ad(2024, 1, 2)).unwrap();
    let evaluator = CircularEvaluator::new().coverage_end(end);
    let mut b = batcher(&repo, evaluator, &["Earth", "Mars"], options(100));

    let err = b
        .run(DateRange::new(ad(2024, 1, 1), ad(2024, 1, 5), 1.0))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::EphemerisUnavailable { .. }));
    assert_eq!(repo.record_count(), 4);
    assert_eq!(b.pending(), 0);
    assert_eq!(b.state(), BatcherState::Idle);

    let report = b.last_report();
    assert!(matches!(report.outcome, RunOutcome::Failed { .. }));
    let cursor = repo.load_cursor(&report.run_key).await.unwrap().unwrap();
    assert_eq!(cursor.last_label, ad(2024, 1, 2));
}

#[tokio::test]
async fn test_parallel_sampling_keeps_body_order() {
    let sequential = Arc::new(LocalRepository::new());
    let parallel = Arc::new(LocalRepository::new());
    let names = ["Mercury", "Venus", "Earth", "Mars", "Jupiter"];

    batcher(&sequential, CircularEvaluator::new(), &names, options(7))
        .run(three_days())
        .await
        .unwrap();
    batcher(
        &parallel,
        CircularEvaluator::new(),
        &names,
        BatcherOptions {
            batch_size: 7,
            sampling_concurrency: 4,
        },
    )
    .run(three_days())
    .await
    .unwrap();

    assert_eq!(sequential.stored_records(), parallel.stored_records());
    assert_eq!(parallel.batch_sizes(), vec![7, 7, 1]);
}

#[tokio::test]
async fn test_unavailable_storage_fails_before_sampling() {
    let repo = Arc::new(LocalRepository::new());
    repo.set_healthy(false);
    let evaluator = CircularEvaluator::new();
    let mut b = batcher(&repo, evaluator, &["Earth"], options(10));

    let err = b.run(three_days()).await.unwrap_err();
    assert!(matches!(err, PipelineError::StorageUnavailable(_)));
}

#[tokio::test]
async fn test_invalid_inputs_are_configuration_errors() {
    let repo = Arc::new(LocalRepository::new());
    let empty = StreamingBatcher::new(
        repo.clone(),
        sampler(CircularEvaluator::new()),
        Vec::new(),
        options(10),
    );
    assert!(matches!(empty, Err(PipelineError::Configuration(_))));

    let mut b = batcher(&repo, CircularEvaluator::new(), &["Earth"], options(10));
    let backwards = DateRange::new(ad(2024, 1, 3), ad(2024, 1, 1), 1.0);
    assert!(matches!(
        b.run(backwards).await,
        Err(PipelineError::Configuration(_))
    ));
    assert_eq!(repo.row_count(DatasetKind::Ephemeris).await.unwrap(), 0);
}

#[tokio::test]
async fn test_fractional_steps_cover_range_inclusively() {
    let repo = Arc::new(LocalRepository::new());
    let mut b = batcher(&repo, CircularEvaluator::new(), &["Earth"], options(100));

    let report = b
        .run(DateRange::new(ad(2024, 1, 1), ad(2024, 1, 2), 0.5))
        .await
        .unwrap();

    assert_eq!(report.steps_processed, 3);
    let labels: Vec<String> = repo
        .stored_records()
        .iter()
        .map(|r| r.time.label.to_string())
        .collect();
    assert_eq!(labels, vec!["2024 01 01", "2024 01 01", "2024 01 02"]);
}
