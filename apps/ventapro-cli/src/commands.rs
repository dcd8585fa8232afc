//! # Operator Commands
//!
//! `migrate`, `status` and `revert`, each against an open [`Database`].
//!
//! ## Startup Migration Policy
//! ```text
//! run_pending()
//!   ├── Ok                          → continue startup
//!   ├── Err(transient), time left   → wait (exponential backoff), try again
//!   ├── Err(transient), time spent  → halt, name the version
//!   └── Err(anything else)          → halt, name the version
//! ```

use backoff::backoff::Backoff;
use std::future::Future;
use tracing::{error, info, warn};
use ventapro_core::{MigrationState, RunReport, StatusReport};
use ventapro_db::{Database, MigrationError, MigrationResult};

use crate::config::StartupSettings;
use crate::error::AppResult;

/// Runs `op` until it succeeds, fails with a non-transient error, or the
/// retry budget in `settings` runs out.
pub async fn retry_transient<T, F, Fut>(settings: &StartupSettings, mut op: F) -> MigrationResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = MigrationResult<T>>,
{
    let mut backoff = settings.backoff();
    backoff.reset();
    let mut attempt = 1u32;

    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let version = err.failed_version().unwrap_or("-").to_string();

        if !err.is_transient() || !settings.retries_enabled() {
            return Err(err);
        }

        match backoff.next_backoff() {
            Some(wait) => {
                warn!(
                    version = %version,
                    attempt,
                    wait_ms = wait.as_millis() as u64,
                    error = %err,
                    "Transient migration failure, retrying"
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            None => {
                error!(version = %version, attempt, "Giving up on transient migration failure");
                return Err(err);
            }
        }
    }
}

/// Brings the schema up to date, retrying transient failures.
pub async fn migrate(db: &Database, settings: &StartupSettings) -> AppResult<RunReport> {
    let runner = db.migrator()?;

    let report = retry_transient(settings, || runner.run_pending())
        .await
        .map_err(|err| {
            error!(
                version = err.failed_version().unwrap_or("-"),
                error = %err,
                "Migration failed, halting startup"
            );
            err
        })?;

    if report.is_noop() {
        info!(current = ?report.current_version, "Database schema already up to date");
    } else {
        info!(
            applied = ?report.applied,
            current = ?report.current_version,
            "Database schema migrated"
        );
    }

    Ok(report)
}

/// Prints the status report, as a table or as JSON.
pub async fn status(db: &Database, json: bool) -> AppResult<()> {
    let report = db.migration_status().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_status(&report));
    }

    Ok(())
}

/// Reverts one migration.
pub async fn revert(db: &Database, version: &str) -> AppResult<()> {
    let runner = db.migrator()?;

    if let Err(err) = runner.revert(version).await {
        if matches!(
            err,
            MigrationError::UndefinedVersion { .. } | MigrationError::RevertOutOfOrder { .. }
        ) {
            warn!(version, error = %err, "Revert rejected");
        }
        return Err(err.into());
    }

    println!("Reverted {version}");
    Ok(())
}

/// Plain-text status table.
pub fn render_status(report: &StatusReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{:<10} {:<9} {:<26} {}\n",
        "VERSION", "STATE", "APPLIED AT", "DESCRIPTION"
    ));

    for m in &report.migrations {
        let applied_at = match (m.state, m.applied_at) {
            (MigrationState::Pending, _) | (_, None) => "-".to_string(),
            (_, Some(at)) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        };
        out.push_str(&format!(
            "{:<10} {:<9} {:<26} {}\n",
            m.version,
            m.state.to_string(),
            applied_at,
            m.description
        ));
    }

    for orphan in &report.orphaned {
        out.push_str(&format!("{orphan:<10} {:<9} (not defined in this build)\n", "orphaned"));
    }

    out.push_str(&format!(
        "\ncurrent: {}  pending: {}\n",
        report.current_version.as_deref().unwrap_or("none"),
        report.pending_count()
    ));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use ventapro_db::DbConfig;

    fn fast_retries(max_retry_secs: u64) -> StartupSettings {
        StartupSettings {
            initial_retry_ms: 1,
            max_retry_interval_secs: 1,
            max_retry_secs,
        }
    }

    fn locked() -> MigrationError {
        MigrationError::Transient {
            version: "1.0.2".into(),
            message: "database table is locked".into(),
        }
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let attempts = AtomicUsize::new(0);

        let result = retry_transient(&fast_retries(5), || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(locked())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let attempts = AtomicUsize::new(0);

        let result: MigrationResult<()> = retry_transient(&fast_retries(5), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async {
                Err(MigrationError::Failed {
                    version: "1.0.2".into(),
                    message: "no such table: products".into(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(MigrationError::Failed { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_budget_disables_retry() {
        let attempts = AtomicUsize::new(0);

        let result: MigrationResult<()> = retry_transient(&fast_retries(0), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(locked()) }
        })
        .await;

        assert!(result.unwrap_err().is_transient());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_migrate_fresh_database() {
        let db = Database::connect(DbConfig::in_memory()).await.unwrap();

        let report = migrate(&db, &fast_retries(5)).await.unwrap();
        assert_eq!(report.applied.len(), 5);
        assert_eq!(report.current_version.as_deref(), Some("1.0.4"));

        let again = migrate(&db, &fast_retries(5)).await.unwrap();
        assert!(again.is_noop());
    }

    #[tokio::test]
    async fn test_revert_rejection_keeps_schema() {
        let db = Database::connect(DbConfig::in_memory()).await.unwrap();
        migrate(&db, &fast_retries(5)).await.unwrap();

        let err = revert(&db, "1.0.0").await.unwrap_err();
        assert_eq!(err.exit_code(), 5);

        let status = db.migration_status().await.unwrap();
        assert!(status.is_up_to_date());
    }

    #[tokio::test]
    async fn test_render_status() {
        let db = Database::connect(DbConfig::in_memory()).await.unwrap();
        migrate(&db, &fast_retries(5)).await.unwrap();
        revert(&db, "1.0.4").await.unwrap();

        let report = db.migration_status().await.unwrap();
        let text = render_status(&report);

        assert!(text.starts_with("VERSION"));
        assert!(text.contains("1.0.3      applied"));
        assert!(text.contains("1.0.4      reverted"));
        assert!(text.contains("current: 1.0.3  pending: 1"));
    }
}
