use indoc::formatdoc;
use sqlx::{query_as, PgExecutor};
use uuid::Uuid;

use crate::envelope::JobEnvelope;
use crate::errors::Result;

/// Transitions a processing job to completed.
///
/// The status predicate makes concurrent complete/fail calls against the
/// same job race to a single winner; losers see an empty result. Completion
/// results are not persisted, the operations layer echoes them back.
#[tracing::instrument(skip_all, err, fields(otel.kind = "client", db.system = "postgresql"))]
pub(crate) async fn complete_job(
    executor: impl for<'e> PgExecutor<'e>,
    relation: &str,
    job_id: Uuid,
) -> Result<Option<JobEnvelope>> {
    let sql = formatdoc!(
        r#"
            update {relation} as jobs
                set
                    status = 'completed',
                    completed_at = now(),
                    updated_at = now(),
                    worker_id = null
                where jobs.id = $1::uuid and jobs.status = 'processing'
                returning *;
        "#
    );

    let job = query_as(&sql).bind(job_id).fetch_optional(executor).await?;
    Ok(job)
}
