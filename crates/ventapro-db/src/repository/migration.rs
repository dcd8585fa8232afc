//! # Migration Record Repository
//!
//! Reads and writes the `schema_migrations` history table.
//!
//! ## Table Layout
//! ```text
//! ┌────┬─────────┬─────────────────────┬──────────────────────┬─────────┐
//! │ id │ version │ description         │ applied_at           │ success │
//! ├────┼─────────┼─────────────────────┼──────────────────────┼─────────┤
//! │  1 │ 1.0.0   │ create tables       │ 2025-10-04T10:00:00Z │    1    │
//! │  2 │ 1.0.1   │ add indices         │ 2025-10-04T10:00:00Z │    1    │
//! │  3 │ 1.0.2   │ add columns         │ 2025-10-05T09:12:44Z │    0    │ ← reverted
//! └────┴─────────┴─────────────────────┴──────────────────────┴─────────┘
//! ```
//!
//! Reads go through the pool. Writes take the caller's connection because
//! they must land in the same transaction as the migration they describe.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use ventapro_core::MigrationRecord;

/// Repository for migration history.
#[derive(Debug, Clone)]
pub struct MigrationRecordRepository {
    pool: SqlitePool,
}

impl MigrationRecordRepository {
    /// Creates a new MigrationRecordRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MigrationRecordRepository { pool }
    }

    /// Creates the history table if it does not exist.
    pub async fn ensure_table(&self) -> DbResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                version TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL,
                applied_at TEXT NOT NULL,
                success INTEGER NOT NULL DEFAULT 1
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Versions currently recorded as applied (success = 1).
    pub async fn applied_versions(&self) -> DbResult<Vec<String>> {
        let versions: Vec<String> = sqlx::query_scalar(
            "SELECT version FROM schema_migrations WHERE success = 1 ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(versions)
    }

    /// All records, oldest first.
    pub async fn list(&self) -> DbResult<Vec<MigrationRecord>> {
        let records = sqlx::query_as::<_, MigrationRecord>(
            r#"
            SELECT id, version, description, applied_at, success
            FROM schema_migrations
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Gets the record for a version.
    ///
    /// ## Returns
    /// * `Ok(Some(record))` - Version has been applied at least once
    /// * `Ok(None)` - Never applied
    pub async fn get(&self, version: &str) -> DbResult<Option<MigrationRecord>> {
        let record = sqlx::query_as::<_, MigrationRecord>(
            r#"
            SELECT id, version, description, applied_at, success
            FROM schema_migrations
            WHERE version = ?1
            "#,
        )
        .bind(version)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Total number of rows, reverted ones included.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Records a successful apply inside the migration's transaction.
    ///
    /// A version that was reverted earlier already has a row; that row is
    /// flipped back to success instead of inserting a second one.
    pub async fn record_applied(
        conn: &mut SqliteConnection,
        version: &str,
        description: &str,
        applied_at: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(version, "Recording applied migration");

        sqlx::query(
            r#"
            INSERT INTO schema_migrations (version, description, applied_at, success)
            VALUES (?1, ?2, ?3, 1)
            ON CONFLICT(version) DO UPDATE SET
                description = excluded.description,
                applied_at = excluded.applied_at,
                success = 1
            "#,
        )
        .bind(version)
        .bind(description)
        .bind(applied_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Flips a record to success = 0 inside the revert's transaction.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - No applied record for this version
    pub async fn mark_reverted(conn: &mut SqliteConnection, version: &str) -> DbResult<()> {
        debug!(version, "Marking migration reverted");

        let result = sqlx::query(
            "UPDATE schema_migrations SET success = 0 WHERE version = ?1 AND success = 1",
        )
        .bind(version)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Migration", version));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn repo() -> (Database, MigrationRecordRepository) {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();
        let repo = MigrationRecordRepository::new(db.pool().clone());
        repo.ensure_table().await.unwrap();
        (db, repo)
    }

    #[tokio::test]
    async fn test_ensure_table_is_idempotent() {
        let (_db, repo) = repo().await;
        repo.ensure_table().await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_record_and_revert_cycle() {
        // In-memory pools hold a single connection: release it before reading
        let (db, repo) = repo().await;

        let mut conn = db.pool().acquire().await.unwrap();
        MigrationRecordRepository::record_applied(&mut conn, "1.0.0", "create tables", Utc::now())
            .await
            .unwrap();
        drop(conn);
        assert_eq!(repo.applied_versions().await.unwrap(), vec!["1.0.0"]);

        let mut conn = db.pool().acquire().await.unwrap();
        MigrationRecordRepository::mark_reverted(&mut conn, "1.0.0")
            .await
            .unwrap();
        drop(conn);
        assert!(repo.applied_versions().await.unwrap().is_empty());

        let record = repo.get("1.0.0").await.unwrap().unwrap();
        assert!(!record.success);

        // Re-applying reuses the row
        let mut conn = db.pool().acquire().await.unwrap();
        MigrationRecordRepository::record_applied(&mut conn, "1.0.0", "create tables", Utc::now())
            .await
            .unwrap();
        drop(conn);
        assert_eq!(repo.count().await.unwrap(), 1);
        assert!(repo.get("1.0.0").await.unwrap().unwrap().success);
    }

    #[tokio::test]
    async fn test_mark_reverted_requires_applied_record() {
        let (db, _repo) = repo().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let result = MigrationRecordRepository::mark_reverted(&mut conn, "1.0.9").await;
        assert!(matches!(result, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_orders_by_insertion() {
        let (db, repo) = repo().await;
        let mut conn = db.pool().acquire().await.unwrap();

        for version in ["1.0.1", "1.0.0"] {
            MigrationRecordRepository::record_applied(&mut conn, version, "x", Utc::now())
                .await
                .unwrap();
        }
        drop(conn);

        let versions: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.version)
            .collect();
        assert_eq!(versions, vec!["1.0.1", "1.0.0"]);
    }
}
