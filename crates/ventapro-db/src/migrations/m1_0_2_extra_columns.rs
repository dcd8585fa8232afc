//! Migration 1.0.2: barcode and weight on products, birth date and credit
//! limit on customers.

use async_trait::async_trait;
use sqlx::SqliteConnection;
use ventapro_core::MigrationVersion;

use super::Migration;
use crate::error::StepResult;
use crate::schema;

pub struct ExtraColumns;

/// (table, column, definition)
const COLUMNS: &[(&str, &str, &str)] = &[
    ("products", "barcode", "VARCHAR(50)"),
    ("products", "weight", "DECIMAL(8,3)"),
    ("customers", "birth_date", "DATE"),
    ("customers", "credit_limit", "DECIMAL(10,2) DEFAULT 0.00"),
];

#[async_trait]
impl Migration for ExtraColumns {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(1, 0, 2)
    }

    fn description(&self) -> &str {
        "add columns"
    }

    async fn apply(&self, conn: &mut SqliteConnection) -> StepResult<()> {
        for (table, column, definition) in COLUMNS {
            schema::add_column_if_missing(conn, table, column, definition).await?;
        }
        Ok(())
    }

    async fn revert(&self, conn: &mut SqliteConnection) -> StepResult<()> {
        for (table, column, _) in COLUMNS.iter().rev() {
            schema::drop_column_if_exists(conn, table, column).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::InitialSchema;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_columns_round_trip() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        InitialSchema.apply(&mut conn).await.unwrap();

        ExtraColumns.apply(&mut conn).await.unwrap();
        // Second apply finds every column present
        ExtraColumns.apply(&mut conn).await.unwrap();

        assert!(schema::column_exists(&mut conn, "products", "barcode")
            .await
            .unwrap());
        assert!(schema::column_exists(&mut conn, "customers", "credit_limit")
            .await
            .unwrap());

        // Existing rows pick up the default
        let zero_limit: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM customers WHERE code = 'GENERAL' AND credit_limit = 0",
        )
        .fetch_one(&mut *conn)
        .await
        .unwrap();
        assert_eq!(zero_limit, 1);

        ExtraColumns.revert(&mut conn).await.unwrap();
        let columns = schema::table_columns(&mut conn, "products").await.unwrap();
        assert!(!columns.contains(&"barcode".to_string()));
        assert!(!columns.contains(&"weight".to_string()));
    }

    #[tokio::test]
    async fn test_apply_reports_missing_table() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let result = ExtraColumns.apply(&mut conn).await;
        assert!(matches!(result, Err(crate::error::StepError::Failed(_))));
    }
}
