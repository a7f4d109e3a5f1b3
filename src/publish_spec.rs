use chrono::{DateTime, Utc};
use derive_builder::Builder;
use getset::Getters;
use serde_json::Value;
use uuid::Uuid;

use crate::envelope::JobEnvelope;
use crate::errors::ValidationError;

pub(crate) const DEFAULT_MAX_ATTEMPTS: i32 = 3;

/// Caller input for publishing a job.
///
/// Every field is optional at construction; requiredness and ranges are
/// enforced when the spec is parsed at the publish boundary, so a spec that
/// builds is not necessarily one that publishes. `job_type` and `payload`
/// are required there.
///
/// ```
/// use serde_json::json;
/// use windlass::PublishSpec;
///
/// let spec = PublishSpec::builder()
///     .job_type("email")
///     .payload(json!({ "to": "user@example.com" }))
///     .priority(10)
///     .max_attempts(5)
///     .build();
/// ```
#[derive(Getters, Builder, Debug, Default, Clone)]
#[getset(get = "pub")]
#[builder(
    build_fn(private, name = "build_internal"),
    setter(strip_option),
    default,
    pattern = "owned"
)]
pub struct PublishSpec {
    /// Routing tag workers filter on. Required, non-empty.
    #[builder(setter(into))]
    pub job_type: Option<String>,

    /// The job's payload. Required; must be a JSON object. The queue never
    /// inspects it.
    pub payload: Option<Value>,

    /// Higher-priority jobs are claimed first. Default 0.
    pub priority: Option<i32>,

    /// Attempt budget before the job fails terminally. Default 3.
    pub max_attempts: Option<i32>,

    /// Earliest time the job may be claimed. Defaults to the publish
    /// instant; earlier values are clamped up to it.
    pub scheduled_for: Option<DateTime<Utc>>,

    /// Correlation identifier propagated through the job's lifetime. A
    /// fresh one is generated when omitted.
    #[builder(setter(into))]
    pub trace_id: Option<String>,
}

impl PublishSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> PublishSpecBuilder {
        PublishSpecBuilder::default()
    }

    /// Parses the spec into a fully-formed pending envelope, or reports the
    /// first validation failure. `job_id` and `fallback_trace_id` are
    /// generated by the operations layer.
    pub(crate) fn assemble(
        self,
        job_id: Uuid,
        fallback_trace_id: String,
        now: DateTime<Utc>,
    ) -> Result<JobEnvelope, ValidationError> {
        let job_type = match self.job_type {
            Some(ref t) if !t.is_empty() => t.clone(),
            _ => return Err(ValidationError::MissingJobType),
        };
        let payload = match self.payload {
            Some(ref p) if p.is_object() => p.clone(),
            _ => return Err(ValidationError::PayloadNotAnObject),
        };
        let max_attempts = self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS);
        if max_attempts < 1 {
            return Err(ValidationError::NonPositiveMaxAttempts(max_attempts));
        }
        let trace_id = match self.trace_id {
            Some(t) if !t.is_empty() => t,
            Some(_) => return Err(ValidationError::EmptyTraceId),
            None => fallback_trace_id,
        };

        Ok(JobEnvelope::assemble(
            job_id,
            trace_id,
            job_type,
            payload,
            self.priority.unwrap_or(0),
            max_attempts,
            self.scheduled_for.unwrap_or(now),
            now,
        ))
    }
}

impl PublishSpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(self) -> PublishSpec {
        self.build_internal()
            .expect("There is a default value for all fields")
    }
}
