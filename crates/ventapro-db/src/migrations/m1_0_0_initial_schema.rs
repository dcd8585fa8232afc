//! Migration 1.0.0: core store tables.
//!
//! ```text
//! categories ◄── products ◄── sale_items ──► sales ──► customers
//! users ◄── app_logs
//! settings
//! ```
//!
//! Also seeds the default category and the walk-in customer that sales
//! without a named customer point at.

use async_trait::async_trait;
use sqlx::SqliteConnection;
use ventapro_core::MigrationVersion;

use super::Migration;
use crate::error::StepResult;
use crate::schema;

/// Creates the base schema.
pub struct InitialSchema;

const CREATE_TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name VARCHAR(100) NOT NULL UNIQUE,
        description TEXT,
        active BOOLEAN NOT NULL DEFAULT 1,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code VARCHAR(50) NOT NULL UNIQUE,
        name VARCHAR(200) NOT NULL,
        description TEXT,
        category_id INTEGER,
        purchase_price DECIMAL(10,2) NOT NULL DEFAULT 0.00,
        sale_price DECIMAL(10,2) NOT NULL DEFAULT 0.00,
        stock_current INTEGER NOT NULL DEFAULT 0,
        stock_minimum INTEGER NOT NULL DEFAULT 0,
        unit VARCHAR(20) DEFAULT 'pcs',
        image VARCHAR(255),
        active BOOLEAN NOT NULL DEFAULT 1,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (category_id) REFERENCES categories (id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS customers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code VARCHAR(50) UNIQUE,
        first_name VARCHAR(200) NOT NULL,
        last_name VARCHAR(200),
        email VARCHAR(100),
        phone VARCHAR(20),
        address TEXT,
        tax_id VARCHAR(20),
        active BOOLEAN NOT NULL DEFAULT 1,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sales (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        folio VARCHAR(50) NOT NULL UNIQUE,
        customer_id INTEGER,
        subtotal DECIMAL(10,2) NOT NULL DEFAULT 0.00,
        discount DECIMAL(10,2) NOT NULL DEFAULT 0.00,
        taxes DECIMAL(10,2) NOT NULL DEFAULT 0.00,
        total DECIMAL(10,2) NOT NULL DEFAULT 0.00,
        payment_method VARCHAR(50) NOT NULL DEFAULT 'cash',
        status VARCHAR(20) NOT NULL DEFAULT 'completed',
        sold_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (customer_id) REFERENCES customers (id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sale_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        sale_id INTEGER NOT NULL,
        product_id INTEGER NOT NULL,
        quantity INTEGER NOT NULL,
        unit_price DECIMAL(10,2) NOT NULL,
        line_discount DECIMAL(10,2) NOT NULL DEFAULT 0.00,
        line_subtotal DECIMAL(10,2) NOT NULL,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (sale_id) REFERENCES sales (id) ON DELETE CASCADE,
        FOREIGN KEY (product_id) REFERENCES products (id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username VARCHAR(50) NOT NULL UNIQUE,
        password_hash VARCHAR(255) NOT NULL,
        full_name VARCHAR(200) NOT NULL,
        email VARCHAR(100),
        role VARCHAR(20) NOT NULL DEFAULT 'cashier',
        active BOOLEAN NOT NULL DEFAULT 1,
        last_login_at TIMESTAMP,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS settings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name VARCHAR(100) NOT NULL UNIQUE,
        value TEXT,
        description TEXT,
        value_type VARCHAR(20) NOT NULL DEFAULT 'string',
        updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS app_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        level VARCHAR(10) NOT NULL,
        module VARCHAR(50),
        message TEXT NOT NULL,
        user_id INTEGER,
        ip_address VARCHAR(45),
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (user_id) REFERENCES users (id)
    )
    "#,
];

const CREATE_INDICES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_products_code ON products (code)",
    "CREATE INDEX IF NOT EXISTS idx_products_name ON products (name)",
    "CREATE INDEX IF NOT EXISTS idx_sales_folio ON sales (folio)",
    "CREATE INDEX IF NOT EXISTS idx_sales_sold_at ON sales (sold_at)",
    "CREATE INDEX IF NOT EXISTS idx_sale_items_sale_id ON sale_items (sale_id)",
    "CREATE INDEX IF NOT EXISTS idx_customers_first_name ON customers (first_name)",
    "CREATE INDEX IF NOT EXISTS idx_app_logs_created_at ON app_logs (created_at)",
];

const SEED_ROWS: &[&str] = &[
    "INSERT OR IGNORE INTO categories (name, description) \
     VALUES ('General', 'Default category for unclassified products')",
    "INSERT OR IGNORE INTO customers (code, first_name) VALUES ('GENERAL', 'Walk-in Customer')",
];

// Children before parents so foreign keys never block a drop
const DROP_TABLES: &[&str] = &[
    "DROP TABLE IF EXISTS sale_items",
    "DROP TABLE IF EXISTS sales",
    "DROP TABLE IF EXISTS products",
    "DROP TABLE IF EXISTS categories",
    "DROP TABLE IF EXISTS customers",
    "DROP TABLE IF EXISTS app_logs",
    "DROP TABLE IF EXISTS users",
    "DROP TABLE IF EXISTS settings",
];

#[async_trait]
impl Migration for InitialSchema {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(1, 0, 0)
    }

    fn description(&self) -> &str {
        "create tables"
    }

    async fn apply(&self, conn: &mut SqliteConnection) -> StepResult<()> {
        schema::execute_all(conn, CREATE_TABLES).await?;
        schema::execute_all(conn, CREATE_INDICES).await?;
        schema::execute_all(conn, SEED_ROWS).await?;
        Ok(())
    }

    async fn revert(&self, conn: &mut SqliteConnection) -> StepResult<()> {
        // Dropping a table drops its indices too
        schema::execute_all(conn, DROP_TABLES).await?;
        Ok(())
    }
}
