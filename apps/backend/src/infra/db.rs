//! Process-wide connection pool.
//!
//! The pool is built once from a [`ConnectionDescriptor`] and handed to
//! every request through `AppState`. It is lazy: building it performs no
//! I/O, so the first physical connection is made by whoever uses it first
//! (normally the schema initializer at startup).

use std::future::Future;
use std::time::Duration;

use sea_orm::{DatabaseConnection, SqlxPostgresConnector, SqlxSqliteConnector};
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{info, warn};

use crate::config::db::{ConnectionDescriptor, DbKind, PoolSettings};
use crate::error::AppError;
use crate::infra::schema::ensure_schema;

pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(30);
pub const BOOTSTRAP_MAX_ATTEMPTS: u32 = 5;
pub const BOOTSTRAP_RETRY_INTERVAL_MS: u64 = 500;

/// Ordered statements run on every new physical Postgres connection.
pub fn build_session_statements(settings: &PoolSettings) -> Vec<String> {
    vec![
        // application_name is safe to single-quote; minimal escaping
        format!(
            "SET application_name = '{}';",
            settings.app_name.replace('\'', "''")
        ),
        "SET timezone = 'UTC';".to_string(),
        format!("SET statement_timeout = '{}';", settings.statement_timeout),
    ]
}

/// Build the shared pool without connecting.
pub fn open_pool(
    descriptor: &ConnectionDescriptor,
    settings: &PoolSettings,
) -> Result<DatabaseConnection, AppError> {
    info!(
        "pool=create kind={:?} target={} max={} min={} acquire_timeout_ms={}",
        descriptor.kind(),
        descriptor.redacted_url(),
        settings.max_connections,
        settings.min_connections,
        settings.acquire_timeout_ms
    );

    match descriptor.kind() {
        DbKind::Postgres => {
            let statements = build_session_statements(settings);
            let pool = PgPoolOptions::new()
                .max_connections(settings.max_connections)
                .min_connections(settings.min_connections)
                .acquire_timeout(Duration::from_millis(settings.acquire_timeout_ms))
                .idle_timeout(Some(POOL_IDLE_TIMEOUT))
                .after_connect(move |conn, _meta| {
                    let statements = statements.clone();
                    Box::pin(async move {
                        for stmt in &statements {
                            sqlx::query(stmt).execute(&mut *conn).await?;
                        }
                        Ok(())
                    })
                })
                .connect_lazy_with(descriptor.pg_connect_options());
            Ok(SqlxPostgresConnector::from_sqlx_postgres_pool(pool))
        }
        DbKind::SqliteMemory => {
            // The database lives only as long as its connection: one
            // connection, never reaped.
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .acquire_timeout(Duration::from_millis(settings.acquire_timeout_ms))
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_lazy_with(descriptor.sqlite_connect_options()?);
            Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
        }
    }
}

/// Release every physical connection held by the pool.
pub async fn close_pool(db: DatabaseConnection) {
    match db.close().await {
        Ok(()) => info!("pool=closed"),
        Err(e) => warn!(error = %e, "pool=close_failed"),
    }
}

/// Retry an operation with fixed interval delays, but only while it fails
/// with [`AppError::DbUnavailable`]. Other errors are returned immediately.
pub async fn retry_connection<T, F, Fut>(
    mut connect_fn: F,
    max_attempts: u32,
    interval_ms: u64,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut attempt = 1;
    loop {
        match connect_fn().await {
            Ok(result) => {
                if attempt > 1 {
                    info!(
                        "connection_retry=success attempts={} interval_ms={}",
                        attempt, interval_ms
                    );
                }
                return Ok(result);
            }
            Err(e @ AppError::DbUnavailable { .. }) if attempt < max_attempts => {
                warn!(
                    "connection_retry=failed attempt={} max_attempts={} interval_ms={} error={}",
                    attempt, max_attempts, interval_ms, e
                );
                tokio::time::sleep(Duration::from_millis(interval_ms)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Single startup entrypoint: open the pool and bring the schema up to date.
pub async fn bootstrap_db(
    descriptor: &ConnectionDescriptor,
    settings: &PoolSettings,
) -> Result<DatabaseConnection, AppError> {
    info!(
        "bootstrap=start kind={:?} target={}",
        descriptor.kind(),
        descriptor.redacted_url()
    );

    let db = open_pool(descriptor, settings)?;
    retry_connection(
        || ensure_schema(&db),
        BOOTSTRAP_MAX_ATTEMPTS,
        BOOTSTRAP_RETRY_INTERVAL_MS,
    )
    .await?;

    info!("bootstrap=ready kind={:?}", descriptor.kind());
    Ok(db)
}
