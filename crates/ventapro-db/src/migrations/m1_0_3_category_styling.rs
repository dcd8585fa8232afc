//! Migration 1.0.3: colour and icon for category buttons on the sales screen.

use async_trait::async_trait;
use sqlx::SqliteConnection;
use ventapro_core::MigrationVersion;

use super::Migration;
use crate::error::StepResult;
use crate::schema;

pub struct CategoryStyling;

#[async_trait]
impl Migration for CategoryStyling {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(1, 0, 3)
    }

    fn description(&self) -> &str {
        "category styling"
    }

    async fn apply(&self, conn: &mut SqliteConnection) -> StepResult<()> {
        schema::add_column_if_missing(conn, "categories", "color", "VARCHAR(7) DEFAULT '#007bff'")
            .await?;
        schema::add_column_if_missing(conn, "categories", "icon", "VARCHAR(50) DEFAULT 'category'")
            .await?;
        Ok(())
    }

    async fn revert(&self, conn: &mut SqliteConnection) -> StepResult<()> {
        schema::drop_column_if_exists(conn, "categories", "icon").await?;
        schema::drop_column_if_exists(conn, "categories", "color").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::InitialSchema;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_existing_categories_get_defaults() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        InitialSchema.apply(&mut conn).await.unwrap();

        CategoryStyling.apply(&mut conn).await.unwrap();

        let (color, icon): (String, String) =
            sqlx::query_as("SELECT color, icon FROM categories WHERE name = 'General'")
                .fetch_one(&mut *conn)
                .await
                .unwrap();
        assert_eq!(color, "#007bff");
        assert_eq!(icon, "category");

        CategoryStyling.revert(&mut conn).await.unwrap();
        assert!(!schema::column_exists(&mut conn, "categories", "color")
            .await
            .unwrap());
    }
}
