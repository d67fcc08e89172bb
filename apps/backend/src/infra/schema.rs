//! Schema initialization, run once at process start.

use migration::{get_latest_migration_version, migrate_up};
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::error::AppError;

/// Apply pending migrations. Idempotent: the users table and its unique
/// index are created only if absent.
///
/// This is normally the first use of the lazy pool, so an unreachable
/// store surfaces here as [`AppError::DbUnavailable`].
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), AppError> {
    migrate_up(db).await?;
    let version = schema_version(db).await?;
    info!(
        "schema=ready version={}",
        version.as_deref().unwrap_or("<none>")
    );
    Ok(())
}

/// Latest applied migration, if any.
pub async fn schema_version(db: &DatabaseConnection) -> Result<Option<String>, AppError> {
    Ok(get_latest_migration_version(db).await?)
}

#[cfg(test)]
mod tests {
    use sea_orm::{ConnectionTrait, Statement};

    use super::*;
    use crate::config::db::{ConnectionDescriptor, PoolSettings};
    use crate::infra::db::open_pool;

    async fn table_count(db: &DatabaseConnection) -> i64 {
        let row = db
            .query_one(Statement::from_string(
                db.get_database_backend(),
                "SELECT COUNT(*) AS cnt FROM sqlite_master WHERE type = 'table' AND name = 'users'"
                    .to_string(),
            ))
            .await
            .unwrap()
            .unwrap();
        row.try_get::<i64>("", "cnt").unwrap()
    }

    #[tokio::test]
    async fn ensure_schema_is_idempotent() {
        let db = open_pool(&ConnectionDescriptor::sqlite_memory(), &PoolSettings::default())
            .unwrap();

        ensure_schema(&db).await.unwrap();
        ensure_schema(&db).await.unwrap();

        assert_eq!(table_count(&db).await, 1);
        assert_eq!(
            schema_version(&db).await.unwrap().as_deref(),
            Some("m20250101_000001_create_users")
        );
    }
}
