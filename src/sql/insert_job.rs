use indoc::formatdoc;
use sqlx::{query_as, PgExecutor};
use tracing::debug;

use crate::envelope::JobEnvelope;
use crate::errors::Result;

/// Persists a freshly-assembled envelope.
///
/// `created_at`/`updated_at` are stamped with the database clock, and
/// `scheduled_for` is clamped up to it, so the stored row never claims to
/// have been scheduled before it existed even when the publisher's clock
/// runs behind the server's.
#[tracing::instrument(skip_all, err, fields(otel.kind = "client", db.system = "postgresql"))]
pub(crate) async fn insert_job(
    executor: impl for<'e> PgExecutor<'e>,
    relation: &str,
    envelope: &JobEnvelope,
) -> Result<JobEnvelope> {
    let sql = formatdoc!(
        r#"
            insert into {relation}
                (id, trace_id, type, payload, status, priority, attempts, max_attempts,
                 created_at, updated_at, scheduled_for)
            values
                ($1::uuid, $2::text, $3::text, $4::jsonb, $5::text, $6::int, $7::int, $8::int,
                 now(), now(), greatest($9::timestamptz, now()))
            returning *;
        "#
    );

    let stored: JobEnvelope = query_as(&sql)
        .bind(envelope.job_id())
        .bind(envelope.trace_id())
        .bind(envelope.job_type())
        .bind(envelope.payload())
        .bind(envelope.status())
        .bind(envelope.priority())
        .bind(envelope.attempts())
        .bind(envelope.max_attempts())
        .bind(envelope.scheduled_for())
        .fetch_one(executor)
        .await?;

    debug!(
        job_id = %stored.job_id(),
        job_type = stored.job_type().as_str(),
        "Job inserted"
    );

    Ok(stored)
}
