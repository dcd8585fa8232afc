//! # Domain Types
//!
//! Records and reports shared between the database layer and the app.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐    │
//! │  │ MigrationRecord  │   │ MigrationStatus  │   │    RunReport     │    │
//! │  │ ──────────────── │   │ ──────────────── │   │ ──────────────── │    │
//! │  │ id               │   │ version          │   │ applied          │    │
//! │  │ version (unique) │   │ description      │   │ already_applied  │    │
//! │  │ description      │   │ state            │   │ current_version  │    │
//! │  │ applied_at       │   │ applied_at       │   └──────────────────┘    │
//! │  │ success          │   └──────────────────┘                           │
//! │  └──────────────────┘                                                   │
//! │                                                                         │
//! │  MigrationState:  Pending ──► Applied ──► Reverted ──► Applied ...     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Migration Record
// =============================================================================

/// A row of the `schema_migrations` table.
///
/// Created when a migration's `apply` succeeds. A successful revert flips
/// `success` to false; the row itself is never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MigrationRecord {
    pub id: i64,
    pub version: String,
    pub description: String,
    #[ts(as = "String")]
    pub applied_at: DateTime<Utc>,
    /// False once the migration has been reverted.
    pub success: bool,
}

// =============================================================================
// Migration State
// =============================================================================

/// Lifecycle of a defined migration as seen from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MigrationState {
    /// No record yet.
    Pending,
    /// Record with success = true.
    Applied,
    /// Record with success = false.
    Reverted,
}

impl MigrationState {
    /// Derives the state from an optional stored record.
    pub fn from_record(record: Option<&MigrationRecord>) -> Self {
        match record {
            None => MigrationState::Pending,
            Some(r) if r.success => MigrationState::Applied,
            Some(_) => MigrationState::Reverted,
        }
    }

    /// Returns true if the runner would apply this migration on its next run.
    pub fn is_runnable(&self) -> bool {
        !matches!(self, MigrationState::Applied)
    }
}

impl std::fmt::Display for MigrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationState::Pending => write!(f, "pending"),
            MigrationState::Applied => write!(f, "applied"),
            MigrationState::Reverted => write!(f, "reverted"),
        }
    }
}

// =============================================================================
// Status Reports
// =============================================================================

/// Status of one defined migration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MigrationStatus {
    pub version: String,
    pub description: String,
    pub state: MigrationState,
    /// Last time the migration was applied, if ever.
    #[ts(as = "Option<String>")]
    pub applied_at: Option<DateTime<Utc>>,
}

/// Full status of the schema: every defined migration plus stored versions
/// that no longer have a definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StatusReport {
    pub migrations: Vec<MigrationStatus>,
    /// Versions recorded in storage that are not defined in code.
    pub orphaned: Vec<String>,
    /// Latest applied defined version.
    pub current_version: Option<String>,
}

impl StatusReport {
    /// Number of migrations that would run next time.
    pub fn pending_count(&self) -> usize {
        self.migrations
            .iter()
            .filter(|m| m.state.is_runnable())
            .count()
    }

    /// True when every defined migration is applied.
    pub fn is_up_to_date(&self) -> bool {
        self.pending_count() == 0
    }
}

/// Outcome of a successful `run_pending`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RunReport {
    /// Versions applied by this run, in the order they ran.
    pub applied: Vec<String>,
    /// Defined migrations that were already applied before the run.
    pub already_applied: usize,
    /// Latest applied version after the run.
    pub current_version: Option<String>,
}

impl RunReport {
    /// True when the run had nothing to do.
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(success: bool) -> MigrationRecord {
        MigrationRecord {
            id: 1,
            version: "1.0.0".to_string(),
            description: "create tables".to_string(),
            applied_at: Utc::now(),
            success,
        }
    }

    #[test]
    fn test_state_from_record() {
        assert_eq!(MigrationState::from_record(None), MigrationState::Pending);
        assert_eq!(
            MigrationState::from_record(Some(&record(true))),
            MigrationState::Applied
        );
        assert_eq!(
            MigrationState::from_record(Some(&record(false))),
            MigrationState::Reverted
        );
    }

    #[test]
    fn test_reverted_is_runnable() {
        assert!(MigrationState::Pending.is_runnable());
        assert!(MigrationState::Reverted.is_runnable());
        assert!(!MigrationState::Applied.is_runnable());
    }

    #[test]
    fn test_status_report_counts() {
        let report = StatusReport {
            migrations: vec![
                MigrationStatus {
                    version: "1.0.0".to_string(),
                    description: "create tables".to_string(),
                    state: MigrationState::Applied,
                    applied_at: Some(Utc::now()),
                },
                MigrationStatus {
                    version: "1.0.1".to_string(),
                    description: "add indices".to_string(),
                    state: MigrationState::Pending,
                    applied_at: None,
                },
            ],
            orphaned: vec![],
            current_version: Some("1.0.0".to_string()),
        };
        assert_eq!(report.pending_count(), 1);
        assert!(!report.is_up_to_date());
    }

    #[test]
    fn test_state_serializes_snake_case() {
        let json = serde_json::to_string(&MigrationState::Reverted).unwrap();
        assert_eq!(json, "\"reverted\"");
    }
}
