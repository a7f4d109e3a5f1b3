pub const M000001_MIGRATION: &[&str] = &[
    r#"
        create table :WINDLASS_SCHEMA.:WINDLASS_TABLE (
            id uuid primary key default gen_random_uuid(),
            trace_id text not null,
            type text not null,
            payload jsonb not null default '{}'::jsonb,
            status text not null default 'pending',
            priority int not null default 0,
            attempts int not null default 0,
            max_attempts int not null default 3,
            created_at timestamptz not null default now(),
            updated_at timestamptz not null default now(),
            scheduled_for timestamptz not null default now(),
            started_at timestamptz,
            completed_at timestamptz,
            failed_at timestamptz,
            error text,
            worker_id text
        );
    "#,
    // Claim hot path: eligible pending rows in claim order.
    r#"
        create index :WINDLASS_CLAIM_IDX
            on :WINDLASS_SCHEMA.:WINDLASS_TABLE (priority desc, scheduled_for asc)
            where status = 'pending';
    "#,
    r#"
        create index :WINDLASS_TYPE_IDX
            on :WINDLASS_SCHEMA.:WINDLASS_TABLE (type);
    "#,
    r#"
        create index :WINDLASS_WORKER_IDX
            on :WINDLASS_SCHEMA.:WINDLASS_TABLE (worker_id)
            where worker_id is not null;
    "#,
    r#"
        create index :WINDLASS_TRACE_IDX
            on :WINDLASS_SCHEMA.:WINDLASS_TABLE (trace_id);
    "#,
];
