//! Migration 1.0.1: indices for the reports screen and low-stock alerts.

use async_trait::async_trait;
use sqlx::SqliteConnection;
use ventapro_core::MigrationVersion;

use super::Migration;
use crate::error::StepResult;
use crate::schema;

pub struct QueryIndices;

const CREATE: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_products_low_stock ON products (stock_current, stock_minimum)",
    "CREATE INDEX IF NOT EXISTS idx_sales_status ON sales (status)",
    "CREATE INDEX IF NOT EXISTS idx_sales_payment_method ON sales (payment_method)",
    "CREATE INDEX IF NOT EXISTS idx_sale_items_product_id ON sale_items (product_id)",
    "CREATE INDEX IF NOT EXISTS idx_customers_active ON customers (active)",
];

const DROP: &[&str] = &[
    "DROP INDEX IF EXISTS idx_products_low_stock",
    "DROP INDEX IF EXISTS idx_sales_status",
    "DROP INDEX IF EXISTS idx_sales_payment_method",
    "DROP INDEX IF EXISTS idx_sale_items_product_id",
    "DROP INDEX IF EXISTS idx_customers_active",
];

#[async_trait]
impl Migration for QueryIndices {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(1, 0, 1)
    }

    fn description(&self) -> &str {
        "add indices"
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
    async fn test_indices_created_and_dropped() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        InitialSchema.apply(&mut conn).await.unwrap();

        QueryIndices.apply(&mut conn).await.unwrap();
        assert!(schema::index_exists(&mut conn, "idx_products_low_stock")
            .await
            .unwrap());
        assert!(schema::index_exists(&mut conn, "idx_customers_active")
            .await
            .unwrap());

        QueryIndices.revert(&mut conn).await.unwrap();
        assert!(!schema::index_exists(&mut conn, "idx_sales_status")
            .await
            .unwrap());
        // Base indices from 1.0.0 are untouched
        assert!(schema::index_exists(&mut conn, "idx_sales_folio")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_apply_without_tables_fails() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        assert!(QueryIndices.apply(&mut conn).await.is_err());
    }
}
