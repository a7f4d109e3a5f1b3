use indoc::formatdoc;
use sqlx::{query_as, PgExecutor};
use uuid::Uuid;

use crate::envelope::JobEnvelope;
use crate::errors::Result;

/// Read-only snapshot of a job by id.
pub(crate) async fn fetch_job(
    executor: impl for<'e> PgExecutor<'e>,
    relation: &str,
    job_id: Uuid,
) -> Result<Option<JobEnvelope>> {
    let sql = formatdoc!(
        r#"
            select * from {relation} where id = $1::uuid;
        "#
    );

    let job = query_as(&sql).bind(job_id).fetch_optional(executor).await?;
    Ok(job)
}
