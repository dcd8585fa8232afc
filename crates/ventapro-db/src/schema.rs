//! # Schema Inspection
//!
//! Probe-before-mutate helpers used by migrations.
//!
//! ## Why Probe First
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ✗ ALTER TABLE products ADD COLUMN barcode ...                          │
//! │      └── error "duplicate column"? ignore it and report success         │
//! │          (hides locked tables, typos and real conflicts alike)          │
//! │                                                                         │
//! │  ✓ column_exists(products, barcode)?                                    │
//! │      ├── yes → nothing to do                                            │
//! │      └── no  → ALTER TABLE products ADD COLUMN barcode ...              │
//! │                └── any error propagates and rolls the migration back    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function takes the caller's connection, normally the migration's
//! open transaction, so probes see uncommitted DDL from earlier statements.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Rejects names that cannot be spliced into DDL text safely.
///
/// SQLite cannot bind identifiers as parameters, so table and column names
/// are restricted to ASCII letters, digits and `_`, not starting with a digit.
pub fn check_identifier(name: &str) -> DbResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(DbError::InvalidIdentifier(name.to_string()))
    }
}

/// Returns true if a table with this name exists.
pub async fn table_exists(conn: &mut SqliteConnection, table: &str) -> DbResult<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1")
            .bind(table)
            .fetch_one(&mut *conn)
            .await?;
    Ok(count > 0)
}

/// Returns true if an index with this name exists.
pub async fn index_exists(conn: &mut SqliteConnection, index: &str) -> DbResult<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?1")
            .bind(index)
            .fetch_one(&mut *conn)
            .await?;
    Ok(count > 0)
}

/// Lists a table's columns in declaration order.
///
/// Returns an empty list for a table that does not exist.
pub async fn table_columns(conn: &mut SqliteConnection, table: &str) -> DbResult<Vec<String>> {
    check_identifier(table)?;

    let columns: Vec<String> =
        sqlx::query_scalar("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
            .bind(table)
            .fetch_all(&mut *conn)
            .await?;
    Ok(columns)
}

/// Returns true if `table` has a column named `column`.
pub async fn column_exists(
    conn: &mut SqliteConnection,
    table: &str,
    column: &str,
) -> DbResult<bool> {
    let columns = table_columns(conn, table).await?;
    Ok(columns.iter().any(|c| c.eq_ignore_ascii_case(column)))
}

/// Adds a column unless it is already there.
///
/// ## Arguments
/// * `table` - Existing table
/// * `column` - Column name
/// * `definition` - Type and constraints, e.g. `"DECIMAL(10,2) DEFAULT 0.00"`
///
/// ## Returns
/// * `Ok(true)` - Column was added
/// * `Ok(false)` - Column already existed
/// * `Err(DbError::NotFound)` - Table does not exist
pub async fn add_column_if_missing(
    conn: &mut SqliteConnection,
    table: &str,
    column: &str,
    definition: &str,
) -> DbResult<bool> {
    check_identifier(table)?;
    check_identifier(column)?;

    if !table_exists(conn, table).await? {
        return Err(DbError::not_found("Table", table));
    }

    if column_exists(conn, table, column).await? {
        debug!(table, column, "Column already present, skipping");
        return Ok(false);
    }

    let sql = format!("ALTER TABLE {table} ADD COLUMN {column} {definition}");
    sqlx::query(&sql).execute(&mut *conn).await?;

    debug!(table, column, "Column added");
    Ok(true)
}

/// Drops a column if it is present.
///
/// Requires SQLite 3.35+ (bundled with sqlx). A missing table or column is
/// not an error: there is nothing to undo.
pub async fn drop_column_if_exists(
    conn: &mut SqliteConnection,
    table: &str,
    column: &str,
) -> DbResult<bool> {
    check_identifier(table)?;
    check_identifier(column)?;

    if !column_exists(conn, table, column).await? {
        return Ok(false);
    }

    let sql = format!("ALTER TABLE {table} DROP COLUMN {column}");
    sqlx::query(&sql).execute(&mut *conn).await?;

    debug!(table, column, "Column dropped");
    Ok(true)
}

/// Executes statements in order, stopping at the first failure.
pub async fn execute_all(conn: &mut SqliteConnection, statements: &[&str]) -> DbResult<()> {
    for sql in statements {
        sqlx::query(sql).execute(&mut *conn).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn bare_db() -> Database {
        Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap()
    }

    #[test]
    fn test_check_identifier() {
        assert!(check_identifier("products").is_ok());
        assert!(check_identifier("_tmp_1").is_ok());
        assert!(check_identifier("").is_err());
        assert!(check_identifier("1abc").is_err());
        assert!(check_identifier("products; DROP TABLE users").is_err());
        assert!(check_identifier("name\"").is_err());
    }

    #[tokio::test]
    async fn test_probes() {
        let db = bare_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        assert!(!table_exists(&mut conn, "widgets").await.unwrap());
        assert!(table_columns(&mut conn, "widgets").await.unwrap().is_empty());

        execute_all(
            &mut conn,
            &[
                "CREATE TABLE widgets (id INTEGER PRIMARY KEY, name TEXT)",
                "CREATE INDEX idx_widgets_name ON widgets (name)",
            ],
        )
        .await
        .unwrap();

        assert!(table_exists(&mut conn, "widgets").await.unwrap());
        assert!(index_exists(&mut conn, "idx_widgets_name").await.unwrap());
        assert_eq!(
            table_columns(&mut conn, "widgets").await.unwrap(),
            vec!["id".to_string(), "name".to_string()]
        );
        assert!(column_exists(&mut conn, "widgets", "NAME").await.unwrap());
    }

    #[tokio::test]
    async fn test_add_column_is_idempotent() {
        let db = bare_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        execute_all(&mut conn, &["CREATE TABLE widgets (id INTEGER PRIMARY KEY)"])
            .await
            .unwrap();

        let added = add_column_if_missing(&mut conn, "widgets", "weight", "DECIMAL(8,3)")
            .await
            .unwrap();
        assert!(added);

        let added_again = add_column_if_missing(&mut conn, "widgets", "weight", "DECIMAL(8,3)")
            .await
            .unwrap();
        assert!(!added_again);

        let columns = table_columns(&mut conn, "widgets").await.unwrap();
        assert_eq!(columns.iter().filter(|c| *c == "weight").count(), 1);
    }

    #[tokio::test]
    async fn test_add_column_to_missing_table_fails() {
        let db = bare_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let result = add_column_if_missing(&mut conn, "ghosts", "x", "TEXT").await;
        assert!(matches!(result, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_drop_column() {
        let db = bare_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        execute_all(
            &mut conn,
            &["CREATE TABLE widgets (id INTEGER PRIMARY KEY, color TEXT)"],
        )
        .await
        .unwrap();

        assert!(drop_column_if_exists(&mut conn, "widgets", "color").await.unwrap());
        assert!(!column_exists(&mut conn, "widgets", "color").await.unwrap());
        assert!(!drop_column_if_exists(&mut conn, "widgets", "color").await.unwrap());
        assert!(!drop_column_if_exists(&mut conn, "ghosts", "color").await.unwrap());
    }
}
