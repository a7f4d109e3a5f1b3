use indoc::formatdoc;
use sqlx::{query_as, PgExecutor};
use uuid::Uuid;

use crate::envelope::JobEnvelope;
use crate::errors::Result;

/// Records a failed attempt for a processing job.
///
/// The branch is decided in the statement against the stored post-claim
/// attempt count: at or over budget the job fails terminally and keeps its
/// worker_id for forensics; under budget it returns to pending with
/// `scheduled_for` pushed out by `attempts * 30 seconds` on the database
/// clock.
#[tracing::instrument(skip_all, err, fields(otel.kind = "client", db.system = "postgresql"))]
pub(crate) async fn fail_job(
    executor: impl for<'e> PgExecutor<'e>,
    relation: &str,
    job_id: Uuid,
    message: &str,
) -> Result<Option<JobEnvelope>> {
    let sql = formatdoc!(
        r#"
            update {relation} as jobs
                set
                    status = case
                        when jobs.attempts >= jobs.max_attempts then 'failed'
                        else 'pending'
                    end,
                    error = $2::text,
                    worker_id = case
                        when jobs.attempts >= jobs.max_attempts then jobs.worker_id
                        else null
                    end,
                    failed_at = case
                        when jobs.attempts >= jobs.max_attempts then now()
                        else jobs.failed_at
                    end,
                    scheduled_for = case
                        when jobs.attempts >= jobs.max_attempts then jobs.scheduled_for
                        else now() + (jobs.attempts * interval '30 seconds')
                    end,
                    updated_at = now()
                where jobs.id = $1::uuid and jobs.status = 'processing'
                returning *;
        "#
    );

    let job = query_as(&sql)
        .bind(job_id)
        .bind(message)
        .fetch_optional(executor)
        .await?;
    Ok(job)
}
