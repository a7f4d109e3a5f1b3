pub(crate) mod claim_job;
pub(crate) mod complete_job;
pub(crate) mod fail_job;
pub(crate) mod fetch_job;
pub(crate) mod insert_job;
