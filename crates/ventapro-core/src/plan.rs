//! # Migration Planning
//!
//! Pure set arithmetic between the statically defined migration list and the
//! versions stored as applied.
//!
//! ## Planning a Run
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  defined (code):   1.0.0   1.0.1   1.0.2   1.0.3                        │
//! │  applied (db):     1.0.0           1.0.2           0.9.0                │
//! │                      │       │       │       │       │                  │
//! │                      ▼       ▼       ▼       ▼       ▼                  │
//! │                   skip   PENDING   skip   PENDING  orphaned             │
//! │                            (gap)                                        │
//! │                                                                         │
//! │  pending = [1.0.1, 1.0.3]   (ascending definition order)               │
//! │  gaps    = [1.0.1]          (pending but older than an applied one)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The insertion order of the stored set never matters; only membership does.

use std::collections::BTreeSet;

use crate::error::{CoreError, CoreResult};
use crate::version::MigrationVersion;

/// Checks that the defined list is strictly ascending.
///
/// ## Example
/// ```rust
/// use ventapro_core::plan::validate_order;
/// use ventapro_core::MigrationVersion;
///
/// let ok = [MigrationVersion::new(1, 0, 0), MigrationVersion::new(1, 0, 1)];
/// assert!(validate_order(&ok).is_ok());
///
/// let dup = [MigrationVersion::new(1, 0, 0), MigrationVersion::new(1, 0, 0)];
/// assert!(validate_order(&dup).is_err());
/// ```
pub fn validate_order(defined: &[MigrationVersion]) -> CoreResult<()> {
    for pair in defined.windows(2) {
        let (previous, next) = (pair[0], pair[1]);
        if previous == next {
            return Err(CoreError::DuplicateVersion(next.to_string()));
        }
        if previous > next {
            return Err(CoreError::UnorderedVersions {
                previous: previous.to_string(),
                next: next.to_string(),
            });
        }
    }
    Ok(())
}

/// What a run would do, given what is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationPlan {
    /// Defined versions with no successful record, ascending.
    pub pending: Vec<MigrationVersion>,
    /// Defined versions already recorded as applied.
    pub already_applied: usize,
    /// Stored versions with no definition (kept as stored text).
    pub orphaned: Vec<String>,
    /// Pending versions that sort before some applied version.
    pub gaps: Vec<MigrationVersion>,
    /// Highest defined version that is applied.
    pub latest_applied: Option<MigrationVersion>,
}

impl MigrationPlan {
    /// Builds a plan.
    ///
    /// ## Arguments
    /// * `defined` - The static list, already validated with [`validate_order`]
    /// * `applied` - Versions stored with success = true, in any order
    pub fn build<S: AsRef<str>>(defined: &[MigrationVersion], applied: &[S]) -> Self {
        let defined_set: BTreeSet<MigrationVersion> = defined.iter().copied().collect();

        let mut applied_set = BTreeSet::new();
        let mut orphaned = Vec::new();
        for raw in applied {
            let raw = raw.as_ref();
            match raw.parse::<MigrationVersion>() {
                Ok(v) if defined_set.contains(&v) => {
                    applied_set.insert(v);
                }
                _ => orphaned.push(raw.to_string()),
            }
        }
        orphaned.sort();
        orphaned.dedup();

        let pending: Vec<MigrationVersion> = defined
            .iter()
            .copied()
            .filter(|v| !applied_set.contains(v))
            .collect();

        let latest_applied = applied_set.iter().next_back().copied();
        let gaps = match latest_applied {
            Some(latest) => pending.iter().copied().filter(|v| *v < latest).collect(),
            None => Vec::new(),
        };

        MigrationPlan {
            pending,
            already_applied: applied_set.len(),
            orphaned,
            gaps,
            latest_applied,
        }
    }

    /// True when nothing needs to run.
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Decides whether `version` may be reverted.
///
/// ## Rules
/// 1. It must be defined (`UndefinedVersion`, `NotDefined`)
/// 2. It must be applied (`UndefinedVersion`, `NotApplied`)
/// 3. It must be the latest applied defined version (`RevertOutOfOrder`)
///
/// Rule 3 keeps the applied-set a prefix of the defined list.
pub fn revert_target<S: AsRef<str>>(
    defined: &[MigrationVersion],
    applied: &[S],
    version: MigrationVersion,
) -> CoreResult<()> {
    if !defined.contains(&version) {
        return Err(CoreError::not_defined(version.to_string()));
    }

    let plan = MigrationPlan::build(defined, applied);
    if plan.pending.contains(&version) {
        return Err(CoreError::not_applied(version.to_string()));
    }

    match plan.latest_applied {
        Some(latest) if latest != version => Err(CoreError::RevertOutOfOrder {
            version: version.to_string(),
            blocking: latest.to_string(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> MigrationVersion {
        s.parse().unwrap()
    }

    fn defined() -> Vec<MigrationVersion> {
        vec![v("1.0.0"), v("1.0.1"), v("1.0.2"), v("1.0.3")]
    }

    #[test]
    fn test_validate_order() {
        assert!(validate_order(&defined()).is_ok());
        assert!(validate_order(&[]).is_ok());

        let err = validate_order(&[v("1.0.1"), v("1.0.0")]).unwrap_err();
        assert!(matches!(err, CoreError::UnorderedVersions { .. }));

        let err = validate_order(&[v("1.0.0"), v("1.0.0")]).unwrap_err();
        assert_eq!(err, CoreError::DuplicateVersion("1.0.0".to_string()));
    }

    #[test]
    fn test_empty_applied_set_plans_everything() {
        let plan = MigrationPlan::build::<String>(&defined(), &[]);
        assert_eq!(plan.pending, defined());
        assert_eq!(plan.already_applied, 0);
        assert!(plan.gaps.is_empty());
        assert_eq!(plan.latest_applied, None);
    }

    #[test]
    fn test_applied_order_does_not_matter() {
        let a = MigrationPlan::build(&defined(), &["1.0.1", "1.0.0"]);
        let b = MigrationPlan::build(&defined(), &["1.0.0", "1.0.1"]);
        assert_eq!(a, b);
        assert_eq!(a.pending, vec![v("1.0.2"), v("1.0.3")]);
        assert_eq!(a.already_applied, 2);
    }

    #[test]
    fn test_gaps_and_orphans() {
        let plan = MigrationPlan::build(&defined(), &["1.0.2", "1.0.0", "0.9.0", "garbage"]);
        assert_eq!(plan.pending, vec![v("1.0.1"), v("1.0.3")]);
        assert_eq!(plan.gaps, vec![v("1.0.1")]);
        assert_eq!(plan.orphaned, vec!["0.9.0".to_string(), "garbage".to_string()]);
        assert_eq!(plan.latest_applied, Some(v("1.0.2")));
    }

    #[test]
    fn test_up_to_date() {
        let plan = MigrationPlan::build(&defined(), &["1.0.3", "1.0.2", "1.0.1", "1.0.0"]);
        assert!(plan.is_up_to_date());
        assert_eq!(plan.already_applied, 4);
    }

    #[test]
    fn test_revert_rules() {
        let applied = ["1.0.0", "1.0.1"];

        assert!(revert_target(&defined(), &applied, v("1.0.1")).is_ok());

        assert_eq!(
            revert_target(&defined(), &applied, v("9.9.9")),
            Err(CoreError::not_defined("9.9.9"))
        );
        assert_eq!(
            revert_target(&defined(), &applied, v("1.0.3")),
            Err(CoreError::not_applied("1.0.3"))
        );
        assert_eq!(
            revert_target(&defined(), &applied, v("1.0.0")),
            Err(CoreError::RevertOutOfOrder {
                version: "1.0.0".to_string(),
                blocking: "1.0.1".to_string(),
            })
        );
    }
}
