//! Storage errors and their mapping onto pipeline errors.

use solstream::db::repository::{ErrorContext, RepositoryError};
use solstream::error::PipelineError;

#[test]
fn test_error_context_builder() {
    let ctx = ErrorContext::new("insert_batch")
        .with_entity("ephemeris_data")
        .with_details("rows=1000")
        .retryable();

    assert_eq!(ctx.operation.as_deref(), Some("insert_batch"));
    assert_eq!(ctx.entity.as_deref(), Some("ephemeris_data"));
    assert_eq!(ctx.details.as_deref(), Some("rows=1000"));
    assert!(ctx.retryable);
    assert_eq!(
        ctx.to_string(),
        "[operation=insert_batch, entity=ephemeris_data, details=rows=1000, retryable=true]"
    );
}

#[test]
fn test_default_context_is_not_retryable() {
    let ctx = ErrorContext::new("load_cursor");
    assert!(ctx.entity.is_none());
    assert!(!ctx.retryable);
    assert_eq!(ctx.to_string(), "[operation=load_cursor]");
}

#[test]
fn test_retryable_kinds() {
    assert!(RepositoryError::connection("refused").is_retryable());
    assert!(RepositoryError::timeout("pool exhausted").is_retryable());
    assert!(!RepositoryError::query("syntax").is_retryable());
    assert!(!RepositoryError::validation("unknown body").is_retryable());
    assert!(!RepositoryError::configuration("no url").is_retryable());
}

#[test]
fn test_with_operation_fills_missing_context() {
    let err = RepositoryError::query("constraint violated").with_operation("insert_batch");
    assert_eq!(err.context().operation.as_deref(), Some("insert_batch"));
    assert!(err.to_string().contains("constraint violated"));
    assert!(err.to_string().contains("operation=insert_batch"));
}

#[test]
fn test_string_converts_to_internal_error() {
    let err: RepositoryError = "task join failed".to_string().into();
    assert!(matches!(err, RepositoryError::InternalError { .. }));
}

#[test]
fn test_pipeline_mapping_keeps_pending_count() {
    let lost = PipelineError::from_repository(RepositoryError::timeout("slow"), 7);
    assert!(matches!(lost, PipelineError::StorageUnavailable(_)));

    let failed = PipelineError::from_repository(RepositoryError::transaction("rolled back"), 7);
    match failed {
        PipelineError::PersistenceFailure { pending, source } => {
            assert_eq!(pending, 7);
            assert!(matches!(source, RepositoryError::TransactionError { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let converted: PipelineError = RepositoryError::connection("down").into();
    assert!(converted.is_fatal());
}
