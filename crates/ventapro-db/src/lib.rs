//! # ventapro-db: Database Layer for VentaPro
//!
//! SQLite storage for the VentaPro point of sale, with versioned schema
//! migrations run at startup.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        VentaPro Startup Flow                            │
//! │                                                                         │
//! │  ventapro migrate                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   ventapro-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Migrations   │    │  Repository  │  │   │
//! │  │   │   (pool.rs)   │    │  (runner.rs)  │    │ (migration)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │───►│ 1.0.0 tables  │───►│ schema_      │  │   │
//! │  │   │ WAL, FKs,     │    │ 1.0.1 indices │    │ migrations   │  │   │
//! │  │   │ busy timeout  │    │ ...           │    │              │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │                               │   │
//! │  │                        ┌───────▼───────┐                       │   │
//! │  │                        │   schema.rs   │ probe-before-mutate   │   │
//! │  │                        └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Migration trait, shipped migrations, and the runner
//! - [`schema`] - Table/index/column probes
//! - [`error`] - Database and migration error types
//! - [`repository`] - Migration history store
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ventapro_db::{Database, DbConfig};
//!
//! let db = Database::connect(DbConfig::new("ventapro.db")).await?;
//! let report = db.migrator()?.run_pending().await?;
//! println!("now at {:?}", report.current_version);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod schema;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, MigrationError, MigrationResult, StepError};
pub use migrations::{Migration, MigrationRunner, RunnerOptions};
pub use pool::{Database, DbConfig};
pub use repository::migration::MigrationRecordRepository;
