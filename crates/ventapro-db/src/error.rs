//! # Database Error Types
//!
//! Error types for database operations and schema migrations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError ← Categorized by SQLite result code and message               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StepError ← What a single migration's apply/revert returns            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  MigrationError ← Tagged with the version that failed                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  AppError (in app) ← Startup halts with a message naming the version   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Retry Policy
//! Only transient errors (busy/locked database, pool timeout, dropped
//! connection) are worth retrying, and only by the caller.
//! Everything else needs an operator.

use std::time::Duration;
use thiserror::Error;
use ventapro_core::{CoreError, UndefinedReason};

// =============================================================================
// SQLite Result Codes
// =============================================================================

/// `SQLITE_BUSY`: another connection holds a conflicting lock.
const SQLITE_BUSY: i32 = 5;

/// `SQLITE_LOCKED`: a table in this connection's database is locked.
const SQLITE_LOCKED: i32 = 6;

/// `SQLITE_INTERRUPT`: the statement was aborted by a progress handler.
const SQLITE_INTERRUPT: i32 = 9;

// =============================================================================
// Database Error
// =============================================================================

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// DDL hit an object that already exists.
    ///
    /// ## When This Occurs
    /// - `CREATE TABLE` without `IF NOT EXISTS` on an existing table
    /// - `ALTER TABLE ADD COLUMN` for a column that is already there
    #[error("Schema conflict: {0}")]
    SchemaConflict(String),

    /// Database is busy or a table is locked.
    ///
    /// ## When This Occurs
    /// - Another process holds a write lock longer than `busy_timeout`
    /// - Shared-cache table lock
    #[error("Database busy: {0}")]
    Busy(String),

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Statement aborted before it finished (migration deadline passed).
    #[error("Statement interrupted: {0}")]
    Interrupted(String),

    /// A table or column name that cannot be placed into DDL text.
    #[error("Invalid SQL identifier: '{0}'")]
    InvalidIdentifier(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Returns true if retrying the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DbError::Busy(_) | DbError::PoolExhausted | DbError::ConnectionFailed(_)
        )
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → SQLite code / message analysis
///     code 5 (BUSY), 6 (LOCKED) → DbError::Busy
///     code 9 (INTERRUPT)        → DbError::Interrupted
///     "already exists"          → DbError::SchemaConflict
///     "duplicate column"        → DbError::SchemaConflict
///     UNIQUE / FOREIGN KEY      → constraint variants
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::Io             → DbError::ConnectionFailed
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // Extended result codes carry the primary code in the low byte
                let primary_code = db_err
                    .code()
                    .and_then(|code| code.parse::<i32>().ok())
                    .map(|code| code & 0xff);

                if matches!(primary_code, Some(SQLITE_BUSY) | Some(SQLITE_LOCKED))
                    || msg.contains("database is locked")
                    || msg.contains("database table is locked")
                {
                    DbError::Busy(msg.to_string())
                } else if primary_code == Some(SQLITE_INTERRUPT) || msg == "interrupted" {
                    DbError::Interrupted(msg.to_string())
                } else if msg.contains("already exists") || msg.contains("duplicate column") {
                    DbError::SchemaConflict(msg.to_string())
                } else if msg.contains("UNIQUE constraint failed") {
                    // "UNIQUE constraint failed: <table>.<column>"
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::Io(io) => DbError::ConnectionFailed(io.to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Step Error
// =============================================================================

/// Failure of a single migration's `apply` or `revert`.
///
/// Carries no version: the runner knows which migration it was running and
/// tags the error when it turns it into a [`MigrationError`].
#[derive(Debug, Error)]
pub enum StepError {
    /// Retry later may succeed.
    #[error("{0}")]
    Transient(String),

    /// A conflicting object exists.
    #[error("{0}")]
    SchemaConflict(String),

    /// Anything else.
    #[error("{0}")]
    Failed(String),
}

impl From<DbError> for StepError {
    fn from(err: DbError) -> Self {
        match err {
            e if e.is_transient() => StepError::Transient(e.to_string()),
            e @ (DbError::SchemaConflict(_)
            | DbError::UniqueViolation { .. }
            | DbError::ForeignKeyViolation { .. }) => StepError::SchemaConflict(e.to_string()),
            e => StepError::Failed(e.to_string()),
        }
    }
}

impl From<sqlx::Error> for StepError {
    fn from(err: sqlx::Error) -> Self {
        DbError::from(err).into()
    }
}

/// Result type for migration steps.
pub type StepResult<T> = Result<T, StepError>;

// =============================================================================
// Migration Error
// =============================================================================

/// Tagged outcome of a runner operation.
///
/// ## Taxonomy
/// ```text
/// ┌──────────────────────┬──────────────────────────────┬───────────────────┐
/// │ Variant              │ Cause                        │ Who acts          │
/// ├──────────────────────┼──────────────────────────────┼───────────────────┤
/// │ Transient            │ busy/locked, dropped conn    │ caller retries    │
/// │ SchemaConflict       │ object already exists        │ operator          │
/// │ Timeout              │ step exceeded its deadline   │ operator          │
/// │ Failed               │ any other statement failure  │ operator          │
/// │ UndefinedVersion     │ revert target not defined or │ caller (bad input)│
/// │                      │ never applied                │                   │
/// │ RevertOutOfOrder     │ newer migration still applied│ caller (bad input)│
/// │ InvalidDefinition    │ bad static migration list    │ developer         │
/// │ Storage              │ pool or history table failed │ depends on cause  │
/// └──────────────────────┴──────────────────────────────┴───────────────────┘
/// ```
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Migration {version} failed with a transient storage error: {message}")]
    Transient { version: String, message: String },

    #[error("Migration {version} conflicts with the existing schema: {message}")]
    SchemaConflict { version: String, message: String },

    #[error("Migration {version} timed out after {timeout:?} and was rolled back")]
    Timeout { version: String, timeout: Duration },

    #[error("Migration {version} failed: {message}")]
    Failed { version: String, message: String },

    #[error("Migration {version} {reason}")]
    UndefinedVersion {
        version: String,
        reason: UndefinedReason,
    },

    #[error("Cannot revert {version} while {blocking} is still applied")]
    RevertOutOfOrder { version: String, blocking: String },

    #[error("Invalid migration list: {0}")]
    InvalidDefinition(String),

    #[error("Database error: {0}")]
    Storage(#[from] DbError),
}

impl MigrationError {
    /// Tags a step failure with the version that produced it.
    pub fn step(version: impl Into<String>, err: StepError) -> Self {
        let version = version.into();
        match err {
            StepError::Transient(message) => MigrationError::Transient { version, message },
            StepError::SchemaConflict(message) => {
                MigrationError::SchemaConflict { version, message }
            }
            StepError::Failed(message) => MigrationError::Failed { version, message },
        }
    }

    /// Returns true if the caller may retry with backoff.
    pub fn is_transient(&self) -> bool {
        match self {
            MigrationError::Transient { .. } => true,
            MigrationError::Storage(e) => e.is_transient(),
            _ => false,
        }
    }

    /// The version this error is about, when there is one.
    pub fn failed_version(&self) -> Option<&str> {
        match self {
            MigrationError::Transient { version, .. }
            | MigrationError::SchemaConflict { version, .. }
            | MigrationError::Timeout { version, .. }
            | MigrationError::Failed { version, .. }
            | MigrationError::UndefinedVersion { version, .. }
            | MigrationError::RevertOutOfOrder { version, .. } => Some(version.as_str()),
            MigrationError::InvalidDefinition(_) | MigrationError::Storage(_) => None,
        }
    }
}

impl From<CoreError> for MigrationError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UndefinedVersion { version, reason } => {
                MigrationError::UndefinedVersion { version, reason }
            }
            CoreError::RevertOutOfOrder { version, blocking } => {
                MigrationError::RevertOutOfOrder { version, blocking }
            }
            other => MigrationError::InvalidDefinition(other.to_string()),
        }
    }
}

/// Result type for runner operations.
pub type MigrationResult<T> = Result<T, MigrationError>;
