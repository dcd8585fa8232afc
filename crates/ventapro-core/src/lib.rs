//! # ventapro-core: Pure Migration Logic for VentaPro
//!
//! Versions, stored records, status reports, and the rules that decide which
//! schema migrations run next. Zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        VentaPro Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    ventapro (app)                               │   │
//! │  │    config ──► logging ──► connect ──► migrate ──► serve         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    ventapro-db                                  │   │
//! │  │        pool, schema probes, record store, runner                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ ventapro-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  version  │  │   types   │  │   plan    │  │ validation│  │   │
//! │  │   │ 1.0.2 <   │  │  Record   │  │  pending  │  │   rules   │  │   │
//! │  │   │ 1.0.10    │  │  Status   │  │  revert   │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • PURE FUNCTIONS                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use ventapro_core::plan::MigrationPlan;
//! use ventapro_core::MigrationVersion;
//!
//! let defined = [
//!     MigrationVersion::new(1, 0, 0),
//!     MigrationVersion::new(1, 0, 1),
//!     MigrationVersion::new(1, 0, 2),
//! ];
//!
//! let plan = MigrationPlan::build(&defined, &["1.0.0"]);
//! assert_eq!(plan.pending.len(), 2);
//! assert_eq!(plan.pending[0].to_string(), "1.0.1");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod plan;
pub mod types;
pub mod validation;
pub mod version;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, UndefinedReason, ValidationError};
pub use plan::MigrationPlan;
pub use types::*;
pub use version::MigrationVersion;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Name of the table that records migration history.
pub const MIGRATIONS_TABLE: &str = "schema_migrations";
