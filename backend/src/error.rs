//! Error taxonomy for the ephemeris and solar-activity pipeline.

use crate::db::repository::RepositoryError;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors raised while converting, sampling, deriving or persisting records.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::result_large_err)]
pub enum PipelineError {
    /// A calendar label could not be parsed (bad month token, bad field count...).
    #[error("Malformed time label '{label}': {reason}")]
    MalformedTimeLabel { label: String, reason: String },

    /// A calendar label could not be classified into B.C. or A.D.
    #[error("Unsupported era in time label '{label}'")]
    UnsupportedEra { label: String },

    /// The ephemeris collaborator has no data for the requested body, frame or time.
    #[error("Ephemeris unavailable for {body} at ET {et}: {reason}")]
    EphemerisUnavailable {
        body: String,
        et: f64,
        reason: String,
    },

    /// A derived metric would be infinite or undefined (zero distance, NaN inputs).
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// A model was called without the inputs it needs.
    #[error("Insufficient inputs: {0}")]
    InsufficientInputs(String),

    /// A batch could not be written; the batch is still held by the batcher.
    #[error("Persistence failure ({pending} records retained): {source}")]
    PersistenceFailure {
        pending: usize,
        #[source]
        source: RepositoryError,
    },

    /// The storage collaborator cannot be reached.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[source] RepositoryError),

    /// Invalid configuration or command-line arguments.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A text source could not be ingested as a whole.
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// A sampling task panicked or was cancelled by the runtime.
    #[error("Worker failure: {0}")]
    Worker(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Map a storage error onto the pipeline taxonomy.
    ///
    /// Connection loss and timeouts mean the store is gone; anything else is a
    /// failed write of `pending` records.
    pub fn from_repository(err: RepositoryError, pending: usize) -> Self {
        match err {
            RepositoryError::ConnectionError { .. } | RepositoryError::TimeoutError { .. } => {
                Self::StorageUnavailable(err)
            }
            other => Self::PersistenceFailure {
                pending,
                source: other,
            },
        }
    }

    /// Whether the error must abort a run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::DegenerateGeometry(_))
    }
}

impl From<RepositoryError> for PipelineError {
    fn from(err: RepositoryError) -> Self {
        Self::from_repository(err, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_errors_map_to_storage_unavailable() {
        let err = PipelineError::from_repository(RepositoryError::connection("refused"), 12);
        assert!(matches!(err, PipelineError::StorageUnavailable(_)));
    }

    #[test]
    fn test_query_errors_map_to_persistence_failure() {
        let err = PipelineError::from_repository(RepositoryError::query("constraint"), 12);
        match err {
            PipelineError::PersistenceFailure { pending, .. } => assert_eq!(pending, 12),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_degenerate_geometry_is_not_fatal() {
        assert!(!PipelineError::DegenerateGeometry("zero".into()).is_fatal());
        assert!(PipelineError::UnsupportedEra {
            label: "x".into()
        }
        .is_fatal());
    }
}
