//! # VentaPro Application Library
//!
//! Startup sequence and operator commands for the VentaPro point of sale.
//!
//! ## Module Organization
//! ```text
//! ventapro/
//! ├── lib.rs          ◄─── You are here (startup sequence)
//! ├── main.rs         ◄─── Binary entry, exit codes
//! ├── cli.rs          ◄─── clap definitions
//! ├── config.rs       ◄─── ventapro.toml + environment
//! ├── commands.rs     ◄─── migrate / status / revert
//! └── error.rs        ◄─── AppError and exit codes
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};
use ventapro_db::Database;

use cli::{Cli, Command};
use config::AppConfig;
use error::AppResult;

/// Default log filter when neither `RUST_LOG` nor config sets one.
pub const DEFAULT_LOG_FILTER: &str = "info,ventapro=debug,sqlx=warn";

/// Runs the application.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Application Startup                               │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber, RUST_LOG or the default filter                │
/// │                                                                         │
/// │  2. Load Configuration ───────────────────────────────────────────────► │
/// │     • defaults → ventapro.toml → VENTAPRO_* env → --db flag             │
/// │     • [logging] filter / VENTAPRO_LOG swapped in afterwards             │
/// │                                                                         │
/// │  3. Connect to Database ──────────────────────────────────────────────► │
/// │     • SQLite with WAL mode, busy timeout                                │
/// │     • Migrations NOT run on connect                                     │
/// │                                                                         │
/// │  4. Run Command ──────────────────────────────────────────────────────► │
/// │     • migrate: pending migrations, transient failures retried          │
/// │     • status / revert                                                   │
/// │                                                                         │
/// │  5. Close Pool ───────────────────────────────────────────────────────► │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(cli: Cli) -> AppResult<()> {
    let log_filter = init_tracing();
    info!("Starting VentaPro");

    let mut config = AppConfig::load(cli.config.clone())?;
    if let Some(path) = cli.db.clone() {
        config.database.path = Some(path);
    }

    if let (Some(handle), Some(configured)) = (&log_filter, config.log_filter()) {
        apply_log_filter(handle, configured);
    }

    let db_config = config.db_config()?;
    info!(db_path = %db_config.database_path.display(), "Database path determined");
    let db = Database::connect(db_config).await?;

    let result = match cli.action() {
        Command::Migrate => commands::migrate(&db, &config.startup).await.map(|_| ()),
        Command::Status { json } => commands::status(&db, json).await,
        Command::Revert { version } => commands::revert(&db, &version).await,
    };

    db.close().await;
    result
}

/// Swaps the active log filter once configuration is known.
type LogFilterHandle = reload::Handle<EnvFilter, Registry>;

/// Initializes the tracing subscriber for structured logging.
///
/// Runs before configuration is loaded so config warnings are visible.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=ventapro_db=trace` - Trace the database crate only
/// - Otherwise `[logging] filter` / `VENTAPRO_LOG`, then [`DEFAULT_LOG_FILTER`]
///
/// Returns a handle for the configured filter, or `None` when `RUST_LOG`
/// decides or a subscriber was already installed.
fn init_tracing() -> Option<LogFilterHandle> {
    let from_env = EnvFilter::try_from_default_env().ok();
    let env_decides = from_env.is_some();

    let (filter, handle) =
        reload::Layer::new(from_env.unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER)));

    // Status output owns stdout
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .is_ok();

    (installed && !env_decides).then_some(handle)
}

fn apply_log_filter(handle: &LogFilterHandle, configured: &str) {
    match EnvFilter::try_new(configured) {
        Ok(filter) => {
            if let Err(err) = handle.reload(filter) {
                warn!(error = %err, "Could not apply configured log filter");
            }
        }
        Err(err) => warn!(filter = configured, error = %err, "Ignoring invalid log filter"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_log_filter_replaces_default() {
        let (_layer, handle) =
            reload::Layer::<EnvFilter, Registry>::new(EnvFilter::new(DEFAULT_LOG_FILTER));

        apply_log_filter(&handle, "warn");
        assert_eq!(handle.with_current(|f| f.to_string()).unwrap(), "warn");

        // Malformed directives leave the active filter alone
        apply_log_filter(&handle, "ventapro=loud");
        assert_eq!(handle.with_current(|f| f.to_string()).unwrap(), "warn");
    }
}
