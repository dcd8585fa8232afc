//! # Application Error Type
//!
//! Everything that can stop `ventapro` from starting, and the exit code each
//! one maps to.
//!
//! ## Exit Codes
//! ```text
//! ┌──────┬─────────────────────────────────────────────────────────────────┐
//! │ Code │ Meaning                                                         │
//! ├──────┼─────────────────────────────────────────────────────────────────┤
//! │  0   │ Success                                                         │
//! │  2   │ Bad configuration (file, environment, or flags)                 │
//! │  3   │ Database could not be opened                                    │
//! │  4   │ A migration failed; the message names the version               │
//! │  5   │ Revert request rejected (undefined, not applied, out of order)  │
//! │  1   │ Anything else                                                   │
//! └──────┴─────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use ventapro_db::{DbError, MigrationError};

/// Application error.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Config file could not be read or parsed.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Database could not be opened.
    #[error(transparent)]
    Database(#[from] DbError),

    /// Migration run, revert, or status failed.
    #[error(transparent)]
    Migration(#[from] MigrationError),

    /// Status could not be rendered as JSON.
    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::ConfigLoadFailed(err.to_string())
    }
}

impl AppError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::InvalidConfig(_) | AppError::ConfigLoadFailed(_) => 2,
            AppError::Database(_) => 3,
            AppError::Migration(
                MigrationError::UndefinedVersion { .. } | MigrationError::RevertOutOfOrder { .. },
            ) => 5,
            AppError::Migration(MigrationError::Storage(_)) => 3,
            AppError::Migration(_) => 4,
            AppError::Output(_) => 1,
        }
    }
}

/// Result type for application operations.
pub type AppResult<T> = Result<T, AppError>;
