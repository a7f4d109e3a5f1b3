use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use getset::Getters;
use serde::Serialize;
use serde_json::Value;
use sqlx::postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef};
use sqlx::{Decode, Encode, FromRow, Postgres, Type};
use uuid::Uuid;

use crate::errors::ValidationError;

/// Added delay before a failed job becomes eligible again, keyed by the
/// attempt count just completed. The durable adapter computes the same
/// formula inside its fail statement, on the database clock.
pub(crate) fn retry_backoff(attempts: i32) -> Duration {
    Duration::seconds(i64::from(attempts.max(0)) * 30)
}

/// Lifecycle state of a job.
///
/// `Completed` and `Failed` are sinks: once a job reaches either, no
/// further transitions occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }
}

// Stored as plain text rather than a Postgres enum type, so the schema can
// live under any configurable namespace without type-name lookups.
impl Type<Postgres> for JobStatus {
    fn type_info() -> PgTypeInfo {
        <&str as Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <&str as Type<Postgres>>::compatible(ty)
    }
}

impl<'q> Encode<'q, Postgres> for JobStatus {
    fn encode_by_ref(
        &self,
        buf: &mut PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as Encode<'_, Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

impl<'r> Decode<'r, Postgres> for JobStatus {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let text = <&str as Decode<'_, Postgres>>::decode(value)?;
        Ok(text.parse::<JobStatus>()?)
    }
}

/// The canonical record for one unit of work.
///
/// Envelopes are created by `insert`, mutated only through claim, complete,
/// and fail, and never deleted by the queue. The adapter owns the
/// authoritative copy; everything handed to callers is a snapshot.
#[derive(FromRow, Getters, Debug, Clone, PartialEq, Serialize)]
#[getset(get = "pub")]
pub struct JobEnvelope {
    /// Globally unique job identifier, immutable after insert
    #[sqlx(rename = "id")]
    job_id: Uuid,
    /// Correlation identifier, generated at publish when the caller omits it
    trace_id: String,
    /// Routing tag used by the claim type filter
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    job_type: String,
    /// Opaque structured payload, persisted verbatim
    payload: Value,
    status: JobStatus,
    /// Higher priority claims first
    priority: i32,
    /// Incremented on each claim, never decremented
    attempts: i32,
    max_attempts: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// Earliest time the job is eligible for claim
    scheduled_for: DateTime<Utc>,
    /// Set on the most recent claim
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    failed_at: Option<DateTime<Utc>>,
    /// Last failure reason, overwritten on each fail
    error: Option<String>,
    /// Claiming worker; retained on terminal failure for forensics
    worker_id: Option<String>,
    /// Completion result. Only the in-memory adapter stores this; the
    /// durable schema has no column for it and rows decode as `None`.
    #[sqlx(default)]
    result: Option<Value>,
}

impl JobEnvelope {
    /// Builds a freshly-published envelope in its initial state.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn assemble(
        job_id: Uuid,
        trace_id: String,
        job_type: String,
        payload: Value,
        priority: i32,
        max_attempts: i32,
        scheduled_for: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            job_id,
            trace_id,
            job_type,
            payload,
            status: JobStatus::Pending,
            priority,
            attempts: 0,
            max_attempts,
            created_at: now,
            updated_at: now,
            // A scheduled_for in the past means "run immediately".
            scheduled_for: scheduled_for.max(now),
            started_at: None,
            completed_at: None,
            failed_at: None,
            error: None,
            worker_id: None,
            result: None,
        }
    }

    /// Transitions pending → processing. Callers must have checked the
    /// precondition; this only applies the field updates.
    pub(crate) fn begin_attempt(&mut self, worker_name: &str, now: DateTime<Utc>) {
        self.status = JobStatus::Processing;
        self.attempts += 1;
        self.worker_id = Some(worker_name.to_string());
        self.started_at = Some(now);
        self.updated_at = now;
    }

    /// Transitions processing → completed.
    pub(crate) fn finish(&mut self, result: Option<Value>, now: DateTime<Utc>) {
        self.status = JobStatus::Completed;
        self.completed_at = Some(now);
        self.updated_at = now;
        self.worker_id = None;
        self.result = result;
    }

    /// Transitions processing → pending (requeue with backoff) or
    /// processing → failed, judged on the post-claim attempt count.
    pub(crate) fn record_failure(&mut self, reason: &str, now: DateTime<Utc>) {
        self.error = Some(reason.to_string());
        self.updated_at = now;
        if self.attempts >= self.max_attempts {
            self.status = JobStatus::Failed;
            self.failed_at = Some(now);
        } else {
            self.status = JobStatus::Pending;
            self.worker_id = None;
            self.scheduled_for = now + retry_backoff(self.attempts);
        }
    }

    /// Checks the cross-field rules of the data model.
    ///
    /// Applied to every envelope a storage adapter returns before it is
    /// surfaced to callers, so storage drift shows up as a validation error
    /// instead of silently corrupt state.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.job_type.is_empty() {
            return Err(ValidationError::MissingJobType);
        }
        if self.trace_id.is_empty() {
            return Err(ValidationError::EmptyTraceId);
        }
        if !self.payload.is_object() {
            return Err(ValidationError::PayloadNotAnObject);
        }
        if self.max_attempts < 1 {
            return Err(ValidationError::NonPositiveMaxAttempts(self.max_attempts));
        }
        if self.attempts < 0 {
            return Err(self.broken("attempts must be non-negative"));
        }
        if self.status.is_terminal() && self.attempts > self.max_attempts {
            return Err(self.broken("attempts must not exceed max_attempts in a terminal state"));
        }
        if self.scheduled_for < self.created_at {
            return Err(self.broken("scheduled_for must not precede created_at"));
        }
        match self.status {
            JobStatus::Pending => {
                if self.worker_id.is_some() {
                    return Err(self.broken("a pending job must not hold a worker_id"));
                }
            }
            JobStatus::Processing => {
                if self.worker_id.is_none() {
                    return Err(self.broken("a processing job must hold a worker_id"));
                }
                if self.started_at.is_none() {
                    return Err(self.broken("a processing job must have started_at"));
                }
            }
            JobStatus::Completed => {
                if self.completed_at.is_none() {
                    return Err(self.broken("a completed job must have completed_at"));
                }
            }
            JobStatus::Failed => {
                if self.failed_at.is_none() {
                    return Err(self.broken("a failed job must have failed_at"));
                }
                if self.error.is_none() {
                    return Err(self.broken("a failed job must carry an error"));
                }
            }
        }
        Ok(())
    }

    fn broken(&self, rule: &'static str) -> ValidationError {
        ValidationError::InvariantViolation {
            job_id: self.job_id,
            rule,
        }
    }
}

/// Derived view returned from complete and fail operations.
///
/// `status` reflects the envelope after the update: `completed`, `failed`,
/// or `pending` when a fail requeued the job for another attempt.
#[derive(Getters, Debug, Clone, PartialEq, Serialize)]
#[getset(get = "pub")]
pub struct ResultEnvelope {
    job_id: Uuid,
    trace_id: String,
    #[serde(rename = "type")]
    job_type: String,
    status: JobStatus,
    /// Echo of the caller's completion result; never read back from the
    /// durable store
    result: Option<Value>,
    error: Option<String>,
    finished_at: DateTime<Utc>,
}

impl ResultEnvelope {
    pub(crate) fn from_completion(envelope: &JobEnvelope, result: Option<Value>) -> Self {
        Self {
            job_id: envelope.job_id,
            trace_id: envelope.trace_id.clone(),
            job_type: envelope.job_type.clone(),
            status: JobStatus::Completed,
            result,
            error: None,
            finished_at: envelope.completed_at.unwrap_or(envelope.updated_at),
        }
    }

    pub(crate) fn from_failure(envelope: &JobEnvelope) -> Self {
        Self {
            job_id: envelope.job_id,
            trace_id: envelope.trace_id.clone(),
            job_type: envelope.job_type.clone(),
            status: envelope.status,
            result: None,
            error: envelope.error.clone(),
            finished_at: envelope.failed_at.unwrap_or(envelope.updated_at),
        }
    }
}
