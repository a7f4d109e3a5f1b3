use sqlx::{query, Error as SqlxError, PgPool, Row};
use tracing::info;

use crate::errors::Result;
use crate::migrations::MIGRATIONS;

/// The already-escaped identifiers the migration scripts are written
/// against. Every name is escaped on its own: deriving an index name from
/// the escaped table would break as soon as the table needs quoting.
pub(crate) struct MigrationIdentifiers {
    pub(crate) schema: String,
    pub(crate) table: String,
    pub(crate) migrations_table: String,
    pub(crate) claim_index: String,
    pub(crate) type_index: String,
    pub(crate) worker_index: String,
    pub(crate) trace_index: String,
}

impl MigrationIdentifiers {
    fn apply(&self, statement: &str) -> String {
        statement
            .replace(":WINDLASS_SCHEMA", &self.schema)
            .replace(":WINDLASS_CLAIM_IDX", &self.claim_index)
            .replace(":WINDLASS_TYPE_IDX", &self.type_index)
            .replace(":WINDLASS_WORKER_IDX", &self.worker_index)
            .replace(":WINDLASS_TRACE_IDX", &self.trace_index)
            .replace(":WINDLASS_TABLE", &self.table)
    }
}

async fn install_schema(pool: &PgPool, identifiers: &MigrationIdentifiers) -> Result<()> {
    let create_schema_query = format!(
        r#"
            create schema if not exists {};
        "#,
        identifiers.schema
    );

    let create_migration_table_query = format!(
        r#"
            create table if not exists {}.{} (
                id int primary key,
                ts timestamptz default now() not null
            );
        "#,
        identifiers.schema, identifiers.migrations_table
    );

    let mut tx = pool.begin().await?;
    query(&create_schema_query).execute(&mut *tx).await?;
    query(&create_migration_table_query)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(())
}

/// Brings the configured schema and job table up to date.
///
/// Safe to re-run: applied migrations are recorded in a bookkeeping table
/// named after the job table, so several queues can share one schema. Each
/// migration runs in its own transaction.
pub(crate) async fn migrate(pool: &PgPool, identifiers: &MigrationIdentifiers) -> Result<()> {
    let migrations_status_query = format!(
        "select id from {}.{} order by id desc limit 1",
        identifiers.schema, identifiers.migrations_table
    );
    let last_migration_query_result = query(&migrations_status_query).fetch_optional(pool).await;

    let last_migration = match last_migration_query_result {
        Err(SqlxError::Database(e)) => {
            let Some(code) = e.code() else {
                return Err(SqlxError::Database(e).into());
            };

            // 42P01: undefined table, 3F000: schema does not exist yet.
            // Either way this is the first run here.
            if code == "42P01" || code == "3F000" {
                install_schema(pool, identifiers).await?;
            } else {
                return Err(SqlxError::Database(e).into());
            }

            None
        }
        Err(e) => {
            return Err(e.into());
        }
        Ok(optional_row) => optional_row.map(|row| row.get("id")),
    };

    for (i, migration_statements) in MIGRATIONS.iter().enumerate() {
        let migration_number = (i + 1) as i32;

        if last_migration.is_none() || migration_number > last_migration.unwrap() {
            info!(migration_number, "Executing migration");
            let mut tx = pool.begin().await?;

            for migration_statement in migration_statements.iter() {
                let sql = identifiers.apply(migration_statement);
                query(sql.as_str()).execute(&mut *tx).await?;
            }

            query(
                format!(
                    "insert into {}.{} (id) values ($1)",
                    identifiers.schema, identifiers.migrations_table
                )
                .as_str(),
            )
            .bind(migration_number)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
        }
    }

    Ok(())
}
