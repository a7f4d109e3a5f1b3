#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

mod adapter;
pub mod clock;
mod envelope;
pub mod errors;
mod memory;
mod migrate;
mod migrations;
mod pg;
mod publish_spec;
mod queue;
mod sql;

pub use adapter::StorageAdapter;
pub use envelope::{JobEnvelope, JobStatus, ResultEnvelope};
pub use errors::{QueueError, Result, ValidationError};
pub use memory::MemoryAdapter;
pub use pg::{PgAdapter, PgConfig, PgConfigBuilder};
pub use publish_spec::{PublishSpec, PublishSpecBuilder};
pub use queue::{CompleteRequest, FailRequest, JobQueue, PublishReceipt};
