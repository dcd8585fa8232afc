//! # Validation Module
//!
//! Checks applied to migration definitions and operator input before any
//! statement runs.
//!
//! ## Usage
//! ```rust
//! use ventapro_core::validation::{validate_description, validate_version};
//!
//! let version = validate_version("1.0.2").unwrap();
//! assert_eq!(version.to_string(), "1.0.2");
//!
//! assert!(validate_description("add columns").is_ok());
//! assert!(validate_description("   ").is_err());
//! ```

use crate::error::ValidationError;
use crate::version::MigrationVersion;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest description accepted for a migration.
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// Validates and parses a version typed by an operator.
///
/// Surrounding whitespace is ignored; everything else must be
/// `MAJOR.MINOR.PATCH`.
pub fn validate_version(version: &str) -> ValidationResult<MigrationVersion> {
    version.trim().parse()
}

/// Validates a migration description.
///
/// ## Rules
/// - Must not be blank
/// - At most 200 characters
pub fn validate_description(description: &str) -> ValidationResult<()> {
    let description = description.trim();

    if description.is_empty() {
        return Err(ValidationError::Required {
            field: "description".to_string(),
        });
    }

    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LEN,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_version() {
        assert_eq!(
            validate_version(" 1.0.3 ").unwrap(),
            MigrationVersion::new(1, 0, 3)
        );
        assert!(matches!(
            validate_version(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_version("v1.0.3"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_validate_description() {
        assert!(validate_description("create tables").is_ok());
        assert!(validate_description("").is_err());
        assert!(validate_description(&"A".repeat(201)).is_err());
        assert!(validate_description(&"Á".repeat(200)).is_ok());
    }
}
