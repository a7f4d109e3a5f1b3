use std::sync::Arc;

use chrono::Utc;
use getset::Getters;
use serde_json::Value;
use tracing::{debug, Span};
use uuid::Uuid;

use crate::adapter::StorageAdapter;
use crate::envelope::{JobEnvelope, ResultEnvelope};
use crate::errors::{Result, ValidationError};
use crate::publish_spec::PublishSpec;

/// What a publisher gets back: the generated identifiers.
#[derive(Getters, Debug, Clone, PartialEq, Eq)]
#[getset(get = "pub")]
pub struct PublishReceipt {
    job_id: Uuid,
    trace_id: String,
}

/// Caller input for completing a claimed job.
#[derive(Debug, Clone, Default)]
pub struct CompleteRequest {
    pub job_id: Uuid,
    /// Optional result map, echoed back on the result envelope. Must be a
    /// JSON object when present.
    pub result: Option<Value>,
}

/// Caller input for reporting a failed attempt.
#[derive(Debug, Clone)]
pub struct FailRequest {
    pub job_id: Uuid,
    /// Non-empty failure reason, recorded on the envelope.
    pub error: String,
}

/// The queue operations layer.
///
/// A thin stateless wrapper over a storage adapter: it generates
/// identifiers, assembles envelopes, validates everything crossing the
/// boundary in either direction, and translates adapter rows into
/// caller-facing shapes. Clone freely; all state lives in the adapter.
#[derive(Clone)]
pub struct JobQueue {
    adapter: Arc<dyn StorageAdapter>,
}

impl JobQueue {
    pub fn new(adapter: Arc<dyn StorageAdapter>) -> Self {
        Self { adapter }
    }

    /// Prepares backing storage. Idempotent; sequence it before first use.
    pub async fn initialize(&self) -> Result<()> {
        self.adapter.initialize().await
    }

    /// Releases adapter resources. Terminal.
    pub async fn close(&self) {
        self.adapter.close().await;
    }

    /// Validates and publishes a job, returning its generated identifiers.
    #[tracing::instrument(
        "publish",
        skip_all,
        err,
        fields(job.type = tracing::field::Empty, job.id = tracing::field::Empty)
    )]
    pub async fn publish(&self, spec: PublishSpec) -> Result<PublishReceipt> {
        let job_id = Uuid::new_v4();
        let fallback_trace_id = Uuid::new_v4().to_string();
        let envelope = spec.assemble(job_id, fallback_trace_id, Utc::now())?;

        let span = Span::current();
        span.record("job.type", envelope.job_type().as_str());
        span.record("job.id", job_id.to_string().as_str());

        let stored = self.adapter.insert(envelope).await?;
        stored.validate()?;

        debug!("Job published");

        Ok(PublishReceipt {
            job_id: *stored.job_id(),
            trace_id: stored.trace_id().clone(),
        })
    }

    /// Claims the next eligible job for `worker_name`, or `None` when the
    /// queue has nothing to hand out. An empty `job_types` slice means any
    /// type.
    #[tracing::instrument("claim_next", skip_all, err, fields(worker = worker_name))]
    pub async fn claim_next(
        &self,
        worker_name: &str,
        job_types: &[String],
    ) -> Result<Option<JobEnvelope>> {
        let Some(envelope) = self.adapter.claim(worker_name, job_types).await? else {
            return Ok(None);
        };
        envelope.validate()?;
        Ok(Some(envelope))
    }

    /// Marks a claimed job as completed.
    ///
    /// Returns `None` when the job is missing or not in processing, which
    /// makes duplicate deliveries of the same completion harmless.
    #[tracing::instrument("complete", skip_all, err, fields(job.id = %request.job_id))]
    pub async fn complete(&self, request: CompleteRequest) -> Result<Option<ResultEnvelope>> {
        if let Some(result) = &request.result {
            if !result.is_object() {
                return Err(ValidationError::ResultNotAnObject.into());
            }
        }

        let Some(envelope) = self
            .adapter
            .complete(request.job_id, request.result.clone())
            .await?
        else {
            return Ok(None);
        };
        envelope.validate()?;

        Ok(Some(ResultEnvelope::from_completion(
            &envelope,
            request.result,
        )))
    }

    /// Records a failed attempt for a claimed job.
    ///
    /// The returned envelope's status tells the caller what actually
    /// happened: `pending` when the job was requeued for another attempt,
    /// `failed` when its budget is exhausted. `None` when the job is
    /// missing or not in processing.
    #[tracing::instrument("fail", skip_all, err, fields(job.id = %request.job_id))]
    pub async fn fail(&self, request: FailRequest) -> Result<Option<ResultEnvelope>> {
        if request.error.is_empty() {
            return Err(ValidationError::MissingFailureReason.into());
        }

        let Some(envelope) = self.adapter.fail(request.job_id, &request.error).await? else {
            return Ok(None);
        };
        envelope.validate()?;

        Ok(Some(ResultEnvelope::from_failure(&envelope)))
    }

    /// Read-only snapshot of a job by id.
    pub async fn fetch(&self, job_id: Uuid) -> Result<Option<JobEnvelope>> {
        let Some(envelope) = self.adapter.fetch(job_id).await? else {
            return Ok(None);
        };
        envelope.validate()?;
        Ok(Some(envelope))
    }
}
