use indoc::formatdoc;
use sqlx::{query_as, PgExecutor};

use crate::envelope::JobEnvelope;
use crate::errors::Result;

/// Atomically claims the next eligible job for `worker_name`.
///
/// The inner select takes a row lock and skips rows other claimers hold, so
/// concurrent workers neither block each other nor claim the same job. The
/// update's own `status = 'pending'` predicate re-checks the precondition;
/// an empty result means nothing was eligible.
#[tracing::instrument(skip_all, err, fields(otel.kind = "client", db.system = "postgresql"))]
pub(crate) async fn claim_job(
    executor: impl for<'e> PgExecutor<'e>,
    relation: &str,
    worker_name: &str,
    job_types: &[String],
) -> Result<Option<JobEnvelope>> {
    let type_clause = type_filter_clause(job_types, 2);

    let sql = formatdoc!(
        r#"
            update {relation} as jobs
                set
                    status = 'processing',
                    attempts = jobs.attempts + 1,
                    worker_id = $1::text,
                    started_at = now(),
                    updated_at = now()
                where jobs.status = 'pending'
                and jobs.id = (
                    select candidates.id
                        from {relation} as candidates
                        where candidates.status = 'pending'
                        and candidates.scheduled_for <= now()
                        {type_clause}
                        order by candidates.priority desc, candidates.scheduled_for asc
                        limit 1
                        for update skip locked
                )
                returning *;
        "#
    );

    let mut q = query_as(&sql).bind(worker_name);
    if !job_types.is_empty() {
        q = q.bind(job_types);
    }

    let job = q.fetch_optional(executor).await?;
    Ok(job)
}

fn type_filter_clause(job_types: &[String], param_ord: u8) -> String {
    if job_types.is_empty() {
        return "".into();
    }
    format!("and candidates.type = any(${param_ord}::text[])")
}
