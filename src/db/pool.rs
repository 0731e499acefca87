//! Database connection pool and schema bootstrap

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Create a new database connection pool
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .connect(database_url)
        .await
}

/// Split SQL into statements, keeping `$$` delimited blocks (DO blocks, functions) intact
fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_dollar_block = false;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);

        if c == '$' && chars.peek() == Some(&'$') {
            current.push('$');
            chars.next();
            in_dollar_block = !in_dollar_block;
        } else if c == ';' && !in_dollar_block {
            statements.extend(statement_body(&current));
            current.clear();
        }
    }

    statements.extend(statement_body(&current));
    statements
}

/// Drop leading blank and comment lines; `None` when nothing but comments remains
fn statement_body(chunk: &str) -> Option<String> {
    let body = chunk
        .lines()
        .skip_while(|line| {
            let trimmed = line.trim();
            trimmed.is_empty() || trimmed.starts_with("--")
        })
        .collect::<Vec<_>>()
        .join("\n");

    let body = body.trim();
    (!body.is_empty()).then(|| body.to_string())
}

/// Run the embedded schema migration.
///
/// Statements are idempotent where Postgres allows it; failures of
/// individual statements are logged and skipped so restarts against an
/// existing schema succeed.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    let migration_sql = include_str!("migrations/001_initial.sql");
    let statements = split_sql_statements(migration_sql);
    let total = statements.len();
    let mut skipped = 0usize;

    for statement in statements {
        if let Err(e) = sqlx::query(&statement).execute(pool).await {
            tracing::warn!("Migration statement skipped (possibly already applied): {}", e);
            skipped += 1;
        }
    }

    tracing::info!(
        "Database migrations completed ({} statements, {} skipped)",
        total,
        skipped
    );
    Ok(())
}
