//! # Error Types
//!
//! Domain-specific error types for ventapro-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ventapro-core errors (this file)                                      │
//! │  ├── CoreError        - Migration list and revert planning failures    │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  ventapro-db errors (separate crate)                                   │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── MigrationError   - Tagged runner outcome                          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → MigrationError → AppError         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Migration planning errors.
///
/// These come out of the pure planning rules in [`crate::plan`] before any
/// statement touches the database.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Two migrations share a version.
    #[error("Duplicate migration version {0}")]
    DuplicateVersion(String),

    /// The static list is not in ascending version order.
    #[error("Migration {next} is defined after {previous}; versions must ascend")]
    UnorderedVersions { previous: String, next: String },

    /// Revert target is not a defined migration with a successful record.
    #[error("Migration {version} {reason}")]
    UndefinedVersion {
        version: String,
        reason: UndefinedReason,
    },

    /// Revert target is not the latest applied migration.
    ///
    /// ## When This Occurs
    /// ```text
    /// applied: 1.0.0 ✓  1.0.1 ✓  1.0.2 ✓
    /// revert(1.0.1)
    ///      │
    ///      ▼
    /// RevertOutOfOrder { version: "1.0.1", blocking: "1.0.2" }
    /// ```
    #[error("Cannot revert {version} while {blocking} is still applied")]
    RevertOutOfOrder { version: String, blocking: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Why a revert target counts as undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndefinedReason {
    /// Not in the defined list, or not a version at all.
    NotDefined,
    /// Defined, but has no successful record.
    NotApplied,
}

impl std::fmt::Display for UndefinedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UndefinedReason::NotDefined => write!(f, "is not defined"),
            UndefinedReason::NotApplied => write!(f, "has not been applied"),
        }
    }
}

impl CoreError {
    /// Revert target that no migration defines.
    pub fn not_defined(version: impl Into<String>) -> Self {
        CoreError::UndefinedVersion {
            version: version.into(),
            reason: UndefinedReason::NotDefined,
        }
    }

    /// Revert target that is defined but not applied.
    pub fn not_applied(version: impl Into<String>) -> Self {
        CoreError::UndefinedVersion {
            version: version.into(),
            reason: UndefinedReason::NotApplied,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., malformed version).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::RevertOutOfOrder {
            version: "1.0.1".to_string(),
            blocking: "1.0.2".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot revert 1.0.1 while 1.0.2 is still applied"
        );

        let err = CoreError::UnorderedVersions {
            previous: "1.0.2".to_string(),
            next: "1.0.1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Migration 1.0.1 is defined after 1.0.2; versions must ascend"
        );
    }

    #[test]
    fn test_undefined_version_messages() {
        assert_eq!(
            CoreError::not_defined("9.9.9").to_string(),
            "Migration 9.9.9 is not defined"
        );
        assert_eq!(
            CoreError::not_applied("1.0.3").to_string(),
            "Migration 1.0.3 has not been applied"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "description".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
