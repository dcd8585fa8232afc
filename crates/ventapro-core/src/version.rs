//! # Migration Versions
//!
//! `MAJOR.MINOR.PATCH` identifiers for schema migrations.
//!
//! Ordering is numeric per component, not lexical:
//! ```text
//! "1.0.9"  < "1.0.10"   (numeric)
//! "1.0.10" < "1.0.9"    (what a string sort would say - wrong)
//! ```
//! Versions are persisted as their dotted text form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// A schema migration version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MigrationVersion {
    major: u32,
    minor: u32,
    patch: u32,
}

impl MigrationVersion {
    /// Creates a version from its components.
    #[inline]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        MigrationVersion {
            major,
            minor,
            patch,
        }
    }

    pub const fn major(&self) -> u32 {
        self.major
    }

    pub const fn minor(&self) -> u32 {
        self.minor
    }

    pub const fn patch(&self) -> u32 {
        self.patch
    }
}

impl fmt::Display for MigrationVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for MigrationVersion {
    type Err = ValidationError;

    /// Parses `MAJOR.MINOR.PATCH`.
    ///
    /// ## Example
    /// ```rust
    /// use ventapro_core::MigrationVersion;
    ///
    /// let v: MigrationVersion = "1.0.2".parse().unwrap();
    /// assert_eq!(v, MigrationVersion::new(1, 0, 2));
    /// assert!("1.0".parse::<MigrationVersion>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "version".to_string(),
            reason: reason.to_string(),
        };

        if s.is_empty() {
            return Err(ValidationError::Required {
                field: "version".to_string(),
            });
        }

        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(invalid("expected MAJOR.MINOR.PATCH"));
        }

        let mut numbers = [0u32; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            // u32::from_str accepts a leading '+', which is not a version
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("components must be non-negative integers"));
            }
            *slot = part
                .parse()
                .map_err(|_| invalid("component is out of range"))?;
        }

        Ok(MigrationVersion::new(numbers[0], numbers[1], numbers[2]))
    }
}

impl TryFrom<String> for MigrationVersion {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MigrationVersion> for String {
    fn from(version: MigrationVersion) -> Self {
        version.to_string()
    }
}
