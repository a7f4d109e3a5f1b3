#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::postgres::PgConnectOptions;
use sqlx::PgPool;
use tokio::sync::OnceCell;
use tokio::task::LocalSet;
use windlass::clock::ManualClock;
use windlass::{JobQueue, MemoryAdapter, PgAdapter};

pub async fn enable_logs() {
    static ONCE: OnceCell<()> = OnceCell::const_new();

    ONCE.get_or_init(|| async {
        let fmt_layer = tracing_subscriber::fmt::layer();
        // Log level set to debug except for sqlx set at warn (to not show all sql requests)
        let filter_layer = tracing_subscriber::EnvFilter::try_new("debug,sqlx=warn").unwrap();

        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;
        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .init();
    })
    .await;
}

/// An in-memory queue on a clock that only moves when the test says so.
///
/// The clock starts one second ahead of the wall clock so that jobs
/// published with wall-clock timestamps are immediately eligible.
pub fn manual_memory_queue() -> (JobQueue, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(Utc::now() + Duration::seconds(1)));
    let adapter = MemoryAdapter::with_clock(clock.clone());
    (JobQueue::new(Arc::new(adapter)), clock)
}

#[derive(Clone)]
pub struct TestDatabase {
    pub source_pool: PgPool,
    pub test_pool: PgPool,
    pub name: String,
}

impl TestDatabase {
    async fn drop(&self) {
        self.test_pool.close().await;
        sqlx::query(&format!("DROP DATABASE {} WITH (FORCE)", self.name))
            .execute(&self.source_pool)
            .await
            .expect("Failed to drop test database");
    }

    /// Builds a queue over the default `queue`.`jobs` relation and runs the
    /// schema bootstrap.
    pub async fn queue(&self) -> JobQueue {
        let adapter = PgAdapter::with_pool(self.test_pool.clone(), "queue", "jobs")
            .await
            .expect("Failed to build adapter");
        let queue = JobQueue::new(Arc::new(adapter));
        queue.initialize().await.expect("Failed to initialize");
        queue
    }

    /// Rewinds the schedule of every job of the given type so backoff and
    /// gating tests don't have to sleep.
    pub async fn make_jobs_run_now(&self, job_type: &str) {
        sqlx::query("update queue.jobs set scheduled_for = now() where type = $1")
            .bind(job_type)
            .execute(&self.test_pool)
            .await
            .expect("Failed to update jobs");
    }
}

async fn create_test_database(db_url: &str) -> TestDatabase {
    let mut pg_conn_options: PgConnectOptions =
        db_url.parse().expect("Failed to parse DATABASE_URL");
    pg_conn_options = pg_conn_options.application_name("__test_windlass");

    let pg_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(4)
        .connect_with(pg_conn_options.clone())
        .await
        .expect("Failed to connect to database");

    let db_id = uuid::Uuid::new_v4();
    let db_name = format!("__test_windlass_{}", db_id.simple());

    sqlx::query(&format!("CREATE DATABASE {}", db_name))
        .execute(&pg_pool)
        .await
        .expect("Failed to create test database");

    let test_options = pg_conn_options.database(&db_name);

    let test_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(8)
        .connect_with(test_options)
        .await
        .expect("Failed to connect to test database");

    TestDatabase {
        source_pool: pg_pool,
        test_pool,
        name: db_name,
    }
}

/// Runs a test against a throwaway database, or skips it (with a notice)
/// when no `DATABASE_URL` is configured.
pub async fn with_test_db<F, Fut>(test_fn: F)
where
    F: FnOnce(TestDatabase) -> Fut + 'static,
    Fut: std::future::Future<Output = ()> + 'static,
{
    enable_logs().await;

    let Ok(db_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL is not set, skipping database test");
        return;
    };

    let local_set = LocalSet::new();

    local_set
        .run_until(async move {
            let test_db = create_test_database(&db_url).await;
            let test_db_2 = test_db.clone();

            let result = tokio::task::spawn_local(async move {
                test_fn(test_db_2).await;
            })
            .await;

            test_db.drop().await;
            result.expect("Test failed");
        })
        .await;
}
