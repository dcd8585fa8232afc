//! # Migration Runner
//!
//! Applies, reverts and reports on an ordered list of [`Migration`]s.
//!
//! ## One Transaction Per Migration
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  pending = [1.0.1, 1.0.2, 1.0.3]                                        │
//! │                                                                         │
//! │  1.0.1: BEGIN → apply → record_applied → COMMIT          ✓ kept        │
//! │  1.0.2: BEGIN → apply ✗ (database table is locked)                     │
//! │              └── ROLLBACK: no schema change, no record                 │
//! │  1.0.3: never started                                                   │
//! │                                                                         │
//! │  Err(MigrationError::Transient { version: "1.0.2", .. })               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every step runs under a deadline (`RunnerOptions::statement_timeout`).
//! SQLite interrupts a statement still running at the deadline, so a hung
//! step cannot hold startup past it. The step is rolled back and reported
//! as a timeout.
//!
//! The runner never retries. The caller decides what to do with a
//! transient error.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use sqlx::{Connection, SqliteConnection, SqlitePool};
use tracing::{debug, error, info, warn};
use ventapro_core::plan::{revert_target, validate_order};
use ventapro_core::validation::{validate_description, validate_version};
use ventapro_core::{
    MigrationPlan, MigrationState, MigrationStatus, MigrationVersion, RunReport, StatusReport,
    UndefinedReason,
};

use super::Migration;
use crate::error::{MigrationError, MigrationResult, StepError};
use crate::repository::migration::MigrationRecordRepository;

/// Default deadline for a single apply or revert.
pub const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Tuning knobs for [`MigrationRunner`].
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Deadline for one migration step, including its record write.
    /// Default: 30 seconds
    pub statement_timeout: Duration,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        RunnerOptions {
            statement_timeout: DEFAULT_STATEMENT_TIMEOUT,
        }
    }
}

impl RunnerOptions {
    /// Sets the per-step deadline.
    pub fn statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Apply,
    Revert,
}

/// Runs migrations against a pool.
pub struct MigrationRunner {
    pool: SqlitePool,
    records: MigrationRecordRepository,
    migrations: Vec<Box<dyn Migration>>,
    options: RunnerOptions,
}

impl std::fmt::Debug for MigrationRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationRunner")
            .field("migrations", &self.versions())
            .field("options", &self.options)
            .finish()
    }
}

impl MigrationRunner {
    /// Creates a runner over a static migration list.
    ///
    /// ## Errors
    /// * `MigrationError::InvalidDefinition` - Versions are duplicated or
    ///   not strictly ascending, or a description is blank or too long
    pub fn new(
        pool: SqlitePool,
        migrations: Vec<Box<dyn Migration>>,
        options: RunnerOptions,
    ) -> MigrationResult<Self> {
        for migration in &migrations {
            validate_description(migration.description()).map_err(|e| {
                MigrationError::InvalidDefinition(format!("{}: {e}", migration.version()))
            })?;
        }

        let versions: Vec<MigrationVersion> = migrations.iter().map(|m| m.version()).collect();
        validate_order(&versions)?;

        let records = MigrationRecordRepository::new(pool.clone());
        Ok(MigrationRunner {
            pool,
            records,
            migrations,
            options,
        })
    }

    /// Defined versions, ascending.
    pub fn versions(&self) -> Vec<MigrationVersion> {
        self.migrations.iter().map(|m| m.version()).collect()
    }

    /// Applies every defined migration without a successful record, in order.
    ///
    /// ## Behavior
    /// - Stops at the first failure; earlier migrations stay committed
    /// - Stored order of records is irrelevant, only the set matters
    /// - Records with no definition are logged and otherwise ignored
    /// - Pending versions below the latest applied one are applied too
    ///
    /// ## Returns
    /// * `Ok(RunReport)` - Everything pending was applied (possibly nothing)
    /// * `Err(MigrationError)` - Tagged with the version that failed
    pub async fn run_pending(&self) -> MigrationResult<RunReport> {
        self.records.ensure_table().await?;

        let applied = self.records.applied_versions().await?;
        let plan = MigrationPlan::build(&self.versions(), &applied);

        if !plan.orphaned.is_empty() {
            warn!(
                orphaned = ?plan.orphaned,
                "Database records migrations this build does not define"
            );
        }

        if !plan.gaps.is_empty() {
            let gaps: Vec<String> = plan.gaps.iter().map(ToString::to_string).collect();
            warn!(?gaps, "Applying migrations older than the current version");
        }

        if plan.is_up_to_date() {
            info!(
                applied = plan.already_applied,
                "Schema is up to date, nothing to migrate"
            );
            return Ok(RunReport {
                applied: Vec::new(),
                already_applied: plan.already_applied,
                current_version: plan.latest_applied.map(|v| v.to_string()),
            });
        }

        info!(
            pending = plan.pending.len(),
            applied = plan.already_applied,
            "Applying pending migrations"
        );

        let mut applied_now = Vec::with_capacity(plan.pending.len());
        for migration in self
            .migrations
            .iter()
            .filter(|m| plan.pending.contains(&m.version()))
        {
            self.execute(migration.as_ref(), Direction::Apply).await?;
            applied_now.push(migration.version().to_string());
        }

        // None sorts below Some, so this also covers a fresh database
        let current = plan.pending.last().copied().max(plan.latest_applied);

        info!(count = applied_now.len(), "Migrations complete");
        Ok(RunReport {
            applied: applied_now,
            already_applied: plan.already_applied,
            current_version: current.map(|v| v.to_string()),
        })
    }

    /// Reverts one applied migration and marks its record unsuccessful.
    ///
    /// Only the latest applied migration can be reverted, so the applied
    /// set stays a prefix of the defined list. Rejected requests change
    /// nothing.
    ///
    /// ## Errors
    /// * `UndefinedVersion` - Not a version this build defines, or defined
    ///   but not currently applied (see its `reason`)
    /// * `RevertOutOfOrder` - A newer migration is still applied
    pub async fn revert(&self, version: &str) -> MigrationResult<()> {
        let target = validate_version(version).map_err(|_| MigrationError::UndefinedVersion {
            version: version.to_string(),
            reason: UndefinedReason::NotDefined,
        })?;

        self.records.ensure_table().await?;
        let applied = self.records.applied_versions().await?;
        revert_target(&self.versions(), &applied, target)?;

        let migration = self
            .find(target)
            .ok_or_else(|| MigrationError::UndefinedVersion {
                version: target.to_string(),
                reason: UndefinedReason::NotDefined,
            })?;

        info!(version = %target, description = migration.description(), "Reverting migration");
        self.execute(migration, Direction::Revert).await
    }

    /// Reports every defined migration with its state, plus orphaned records.
    pub async fn status(&self) -> MigrationResult<StatusReport> {
        self.records.ensure_table().await?;
        let records = self.records.list().await?;

        let defined: BTreeSet<MigrationVersion> = self.versions().into_iter().collect();
        let record_for = |version: MigrationVersion| {
            records
                .iter()
                .find(|r| r.version.parse::<MigrationVersion>().ok() == Some(version))
        };

        let migrations: Vec<MigrationStatus> = self
            .migrations
            .iter()
            .map(|m| {
                let record = record_for(m.version());
                MigrationStatus {
                    version: m.version().to_string(),
                    description: m.description().to_string(),
                    state: MigrationState::from_record(record),
                    applied_at: record.map(|r| r.applied_at),
                }
            })
            .collect();

        let orphaned: Vec<String> = records
            .iter()
            .filter(|r| match r.version.parse::<MigrationVersion>() {
                Ok(v) => !defined.contains(&v),
                Err(_) => true,
            })
            .map(|r| r.version.clone())
            .collect();

        let current_version = migrations
            .iter()
            .rev()
            .find(|m| m.state == MigrationState::Applied)
            .map(|m| m.version.clone());

        Ok(StatusReport {
            migrations,
            orphaned,
            current_version,
        })
    }

    /// Latest applied defined version, if any.
    pub async fn current_version(&self) -> MigrationResult<Option<MigrationVersion>> {
        self.records.ensure_table().await?;
        let applied = self.records.applied_versions().await?;
        Ok(MigrationPlan::build(&self.versions(), &applied).latest_applied)
    }

    fn find(&self, version: MigrationVersion) -> Option<&dyn Migration> {
        self.migrations
            .iter()
            .find(|m| m.version() == version)
            .map(|m| m.as_ref())
    }

    /// Runs one step inside its own transaction, under the deadline.
    ///
    /// ## Deadline
    /// ```text
    /// BEGIN ─► install progress handler ─► apply/revert ─► record ─► COMMIT
    ///                  │
    ///                  └── deadline passed: SQLite interrupts the running
    ///                      statement, the step fails, ROLLBACK
    /// ```
    /// The outer `tokio::time::timeout` covers time spent outside SQLite.
    async fn execute(&self, migration: &dyn Migration, direction: Direction) -> MigrationResult<()> {
        let version = migration.version().to_string();
        let timeout = self.options.statement_timeout;
        let started = Instant::now();

        debug!(version = %version, ?direction, "Beginning migration transaction");
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| MigrationError::step(&version, StepError::from(e)))?;
        let mut tx = Connection::begin(&mut *conn)
            .await
            .map_err(|e| MigrationError::step(&version, StepError::from(e)))?;

        let interrupted = Arc::new(AtomicBool::new(false));
        arm_deadline(&mut *tx, started + timeout, interrupted.clone())
            .await
            .map_err(|e| MigrationError::step(&version, StepError::from(e)))?;

        let step = async {
            match direction {
                Direction::Apply => {
                    migration.apply(&mut *tx).await?;
                    MigrationRecordRepository::record_applied(
                        &mut *tx,
                        &version,
                        migration.description(),
                        Utc::now(),
                    )
                    .await?;
                }
                Direction::Revert => {
                    migration.revert(&mut *tx).await?;
                    MigrationRecordRepository::mark_reverted(&mut *tx, &version).await?;
                }
            }
            Ok::<(), StepError>(())
        };

        let outcome = tokio::time::timeout(timeout, step).await;

        // The connection goes back to the pool afterwards; it must not keep
        // interrupting statements.
        if let Err(e) = disarm_deadline(&mut *tx).await {
            warn!(version = %version, error = %e, "Could not remove statement deadline");
        }

        let err = match outcome {
            Ok(Ok(())) => {
                tx.commit()
                    .await
                    .map_err(|e| MigrationError::step(&version, StepError::from(e)))?;

                info!(
                    version = %version,
                    description = migration.description(),
                    ?direction,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Migration committed"
                );
                return Ok(());
            }
            Ok(Err(_)) | Err(_) if interrupted.load(Ordering::Acquire) => MigrationError::Timeout {
                version: version.clone(),
                timeout,
            },
            Ok(Err(step_err)) => MigrationError::step(&version, step_err),
            Err(_) => MigrationError::Timeout {
                version: version.clone(),
                timeout,
            },
        };

        if let Err(rollback_err) = tx.rollback().await {
            // An interrupted write can end the transaction inside SQLite
            // already; don't hand that connection to anyone else.
            error!(version = %version, error = %rollback_err, "Rollback failed");
            conn.close_on_drop();
        }

        error!(
            version = %version,
            ?direction,
            elapsed_ms = started.elapsed().as_millis() as u64,
            error = %err,
            "Migration rolled back"
        );
        Err(err)
    }
}

/// SQLite virtual machine instructions between deadline checks.
const DEADLINE_CHECK_OPS: i32 = 1_000;

/// Makes SQLite abort whatever this connection is running once `deadline`
/// passes. `interrupted` is set when that happens.
async fn arm_deadline(
    conn: &mut SqliteConnection,
    deadline: Instant,
    interrupted: Arc<AtomicBool>,
) -> Result<(), sqlx::Error> {
    let mut handle = conn.lock_handle().await?;
    handle.set_progress_handler(DEADLINE_CHECK_OPS, move || {
        if Instant::now() < deadline {
            return true;
        }
        interrupted.store(true, Ordering::Release);
        false
    });
    Ok(())
}

async fn disarm_deadline(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    conn.lock_handle().await?.remove_progress_handler();
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
