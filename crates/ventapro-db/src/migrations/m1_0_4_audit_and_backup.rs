//! Migration 1.0.4: audit trail and scheduled backup targets.

use async_trait::async_trait;
use sqlx::SqliteConnection;
use ventapro_core::MigrationVersion;

use super::Migration;
use crate::error::StepResult;
use crate::schema;

pub struct AuditAndBackup;

const CREATE: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS audit_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        table_name VARCHAR(50) NOT NULL,
        action VARCHAR(20) NOT NULL,
        record_id INTEGER,
        old_values TEXT,
        new_values TEXT,
        user_id INTEGER,
        performed_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (user_id) REFERENCES users (id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS backup_config (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name VARCHAR(100) NOT NULL,
        destination_path TEXT NOT NULL,
        frequency_hours INTEGER DEFAULT 24,
        active BOOLEAN DEFAULT 1,
        last_backup_at TIMESTAMP,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
    "#,
];

const DROP: &[&str] = &[
    "DROP TABLE IF EXISTS audit_log",
    "DROP TABLE IF EXISTS backup_config",
];

#[async_trait]
impl Migration for AuditAndBackup {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(1, 0, 4)
    }

    fn description(&self) -> &str {
        "audit and backup tables"
    }

    async fn apply(&self, conn: &mut SqliteConnection) -> StepResult<()> {
        schema::execute_all(conn, CREATE).await?;
        Ok(())
    }

    async fn revert(&self, conn: &mut SqliteConnection) -> StepResult<()> {
        schema::execute_all(conn, DROP).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::InitialSchema;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_tables_created_and_dropped() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        InitialSchema.apply(&mut conn).await.unwrap();

        AuditAndBackup.apply(&mut conn).await.unwrap();
        assert!(schema::table_exists(&mut conn, "audit_log").await.unwrap());
        assert!(schema::table_exists(&mut conn, "backup_config").await.unwrap());

        AuditAndBackup.revert(&mut conn).await.unwrap();
        assert!(!schema::table_exists(&mut conn, "audit_log").await.unwrap());
        assert!(!schema::table_exists(&mut conn, "backup_config").await.unwrap());
        assert!(schema::table_exists(&mut conn, "users").await.unwrap());
    }
}
