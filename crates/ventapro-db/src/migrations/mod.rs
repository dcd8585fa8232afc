//! # Database Migrations
//!
//! Schema migrations for VentaPro, defined in Rust and run by
//! [`MigrationRunner`].
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  App Startup                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Ensure schema_migrations table                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Compare all() vs applied                                              │
//! │       │                                                                 │
//! │       ├── 1.0.0 create tables      ✓ (already applied)                │
//! │       ├── 1.0.1 add indices        ✓ (already applied)                │
//! │       └── 1.0.2 add columns        ⬜ (NEW - needs to run)             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  For each pending, in order:                                           │
//! │    BEGIN → apply → record → COMMIT                                     │
//! │    (any failure: ROLLBACK, stop, report the version)                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  App continues startup                                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create `mX_Y_Z_description.rs` with a unit struct implementing [`Migration`]
//! 2. Append it to [`all()`] with a version greater than the last one
//! 3. Make `apply` idempotent by construction: `IF NOT EXISTS`,
//!    [`schema::add_column_if_missing`](crate::schema::add_column_if_missing)
//! 4. **NEVER** modify a migration that has shipped - always add a new one

use async_trait::async_trait;
use sqlx::SqliteConnection;
use ventapro_core::MigrationVersion;

use crate::error::StepResult;

mod m1_0_0_initial_schema;
mod m1_0_1_query_indices;
mod m1_0_2_extra_columns;
mod m1_0_3_category_styling;
mod m1_0_4_audit_and_backup;
pub mod runner;

pub use m1_0_0_initial_schema::InitialSchema;
pub use m1_0_1_query_indices::QueryIndices;
pub use m1_0_2_extra_columns::ExtraColumns;
pub use m1_0_3_category_styling::CategoryStyling;
pub use m1_0_4_audit_and_backup::AuditAndBackup;
pub use runner::{MigrationRunner, RunnerOptions};

/// A versioned schema change.
///
/// Both operations receive the open transaction the runner created for them.
/// They must not commit or roll back themselves.
#[async_trait]
pub trait Migration: Send + Sync {
    /// Position in the ordered list.
    fn version(&self) -> MigrationVersion;

    /// Human-readable summary, stored with the record.
    fn description(&self) -> &str;

    /// Brings the schema forward.
    async fn apply(&self, conn: &mut SqliteConnection) -> StepResult<()>;

    /// Undoes [`apply`](Migration::apply).
    async fn revert(&self, conn: &mut SqliteConnection) -> StepResult<()>;
}

/// The migrations this application ships, in order.
pub fn all() -> Vec<Box<dyn Migration>> {
    vec![
        Box::new(InitialSchema),
        Box::new(QueryIndices),
        Box::new(ExtraColumns),
        Box::new(CategoryStyling),
        Box::new(AuditAndBackup),
    ]
}
