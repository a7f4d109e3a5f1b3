use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during queue operations.
///
/// Note that a job being absent, or not in the state an operation requires,
/// is not an error: those operations return `Ok(None)` so that retried
/// deliveries stay idempotent.
#[derive(Error, Debug)]
pub enum QueueError {
    /// An error occurred while executing an SQL query
    #[error("Error occured while query: {0}")]
    Sql(#[from] sqlx::Error),

    /// Caller-supplied data or an adapter-returned envelope failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The adapter was constructed with unusable configuration
    #[error("Adapter configuration error: {0}")]
    Configuration(String),

    /// The adapter has been closed and can no longer serve requests
    #[error("Storage adapter is closed")]
    AdapterClosed,
}

/// Violations detected when parsing caller input or revalidating an
/// envelope returned by a storage adapter.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Job type must be a non-empty string")]
    MissingJobType,

    #[error("Payload must be a JSON object")]
    PayloadNotAnObject,

    #[error("Completion result must be a JSON object")]
    ResultNotAnObject,

    #[error("Failure reason must be a non-empty string")]
    MissingFailureReason,

    #[error("Trace id must be a non-empty string")]
    EmptyTraceId,

    #[error("max_attempts must be at least 1, got {0}")]
    NonPositiveMaxAttempts(i32),

    #[error("Unknown job status: {0:?}")]
    UnknownStatus(String),

    /// A stored envelope broke one of the cross-field rules of the data
    /// model. Seeing this means the storage layer has drifted from what the
    /// queue writes.
    #[error("Job {job_id} violates the envelope invariant: {rule}")]
    InvariantViolation {
        job_id: Uuid,
        rule: &'static str,
    },
}

/// A Result type alias for QueueError.
pub type Result<T> = core::result::Result<T, QueueError>;
