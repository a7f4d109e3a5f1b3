use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::envelope::JobEnvelope;
use crate::errors::Result;

/// Backend-specific implementation of the storage contract.
///
/// `claim`, `complete`, and `fail` are the only operations whose mechanics
/// differ between backends; their observable semantics must not. Operations
/// whose precondition does not hold (job missing, or not in the state the
/// operation requires) return `Ok(None)`, never an error.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Prepares backing storage (relations, indexes). Idempotent, but not
    /// concurrency-safe against itself: sequence it before first use.
    async fn initialize(&self) -> Result<()>;

    /// Releases all resources. After close, further calls may fail.
    async fn close(&self);

    /// Persists a fully-formed envelope and returns the stored copy, with
    /// any defaults the storage applied.
    async fn insert(&self, envelope: JobEnvelope) -> Result<JobEnvelope>;

    /// Atomically transitions one eligible pending job to processing on
    /// behalf of `worker_name`. An empty `job_types` slice means no type
    /// filter. `None` when nothing is eligible.
    async fn claim(&self, worker_name: &str, job_types: &[String]) -> Result<Option<JobEnvelope>>;

    /// Transitions a processing job to completed.
    async fn complete(&self, job_id: Uuid, result: Option<Value>) -> Result<Option<JobEnvelope>>;

    /// Requeues the job with backoff, or fails it terminally once its
    /// attempt budget is spent.
    async fn fail(&self, job_id: Uuid, error: &str) -> Result<Option<JobEnvelope>>;

    /// Read-only snapshot of a job by id.
    async fn fetch(&self, job_id: Uuid) -> Result<Option<JobEnvelope>>;
}
