use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::adapter::StorageAdapter;
use crate::clock::{Clock, SystemClock};
use crate::envelope::{JobEnvelope, JobStatus};
use crate::errors::{QueueError, Result};

/// In-process reference adapter with the same observable semantics as the
/// durable one, minus persistence.
///
/// State lives in a single map behind an async mutex, so operations are
/// serialized; this is enough for cooperative single-process use (tests,
/// tooling) but it is not a safe coordination point for a real worker
/// fleet.
pub struct MemoryAdapter {
    state: Mutex<MemoryState>,
    clock: Arc<dyn Clock>,
}

struct MemoryState {
    jobs: HashMap<Uuid, JobEnvelope>,
    closed: bool,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Uses the given clock for every timestamp the adapter produces.
    /// Pair with [`ManualClock`](crate::clock::ManualClock) to test
    /// schedule gating and retry backoff without sleeping.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                jobs: HashMap::new(),
                closed: false,
            }),
            clock,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

impl Default for MemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryState {
    fn guard_open(&self) -> Result<()> {
        if self.closed {
            return Err(QueueError::AdapterClosed);
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for MemoryAdapter {
    async fn initialize(&self) -> Result<()> {
        self.state.lock().await.guard_open()
    }

    async fn close(&self) {
        self.state.lock().await.closed = true;
    }

    async fn insert(&self, envelope: JobEnvelope) -> Result<JobEnvelope> {
        let mut state = self.state.lock().await;
        state.guard_open()?;
        state.jobs.insert(*envelope.job_id(), envelope.clone());
        Ok(envelope)
    }

    async fn claim(&self, worker_name: &str, job_types: &[String]) -> Result<Option<JobEnvelope>> {
        let now = self.now();
        let mut state = self.state.lock().await;
        state.guard_open()?;

        // Same selection rule as the durable claim query: eligible pending
        // rows ordered by priority desc, scheduled_for asc, first one wins.
        let mut candidates: Vec<(i32, DateTime<Utc>, Uuid)> = state
            .jobs
            .values()
            .filter(|job| {
                *job.status() == JobStatus::Pending
                    && *job.scheduled_for() <= now
                    && (job_types.is_empty() || job_types.contains(job.job_type()))
            })
            .map(|job| (*job.priority(), *job.scheduled_for(), *job.job_id()))
            .collect();
        candidates.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let Some((_, _, job_id)) = candidates.first() else {
            return Ok(None);
        };

        let job = state
            .jobs
            .get_mut(job_id)
            .expect("candidate ids come from the map itself");
        job.begin_attempt(worker_name, now);
        Ok(Some(job.clone()))
    }

    async fn complete(&self, job_id: Uuid, result: Option<Value>) -> Result<Option<JobEnvelope>> {
        let now = self.now();
        let mut state = self.state.lock().await;
        state.guard_open()?;

        let Some(job) = state.jobs.get_mut(&job_id) else {
            return Ok(None);
        };
        if *job.status() != JobStatus::Processing {
            return Ok(None);
        }

        job.finish(result, now);
        Ok(Some(job.clone()))
    }

    async fn fail(&self, job_id: Uuid, error: &str) -> Result<Option<JobEnvelope>> {
        let now = self.now();
        let mut state = self.state.lock().await;
        state.guard_open()?;

        let Some(job) = state.jobs.get_mut(&job_id) else {
            return Ok(None);
        };
        if *job.status() != JobStatus::Processing {
            return Ok(None);
        }

        job.record_failure(error, now);
        Ok(Some(job.clone()))
    }

    async fn fetch(&self, job_id: Uuid) -> Result<Option<JobEnvelope>> {
        let state = self.state.lock().await;
        state.guard_open()?;
        Ok(state.jobs.get(&job_id).cloned())
    }
}
