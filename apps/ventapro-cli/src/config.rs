//! # Application Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command line flags (highest priority)                              │
//! │     --db ./store.db                                                    │
//! │                                                                         │
//! │  2. Environment Variables                                              │
//! │     VENTAPRO_DB_PATH=/srv/ventapro/store.db                            │
//! │     VENTAPRO_LOG=debug                                                 │
//! │     VENTAPRO_STATEMENT_TIMEOUT_SECS=60                                 │
//! │     VENTAPRO_MAX_RETRY_SECS=120                                        │
//! │                                                                         │
//! │  3. TOML Config File                                                   │
//! │     ~/.config/ventapro/ventapro.toml (Linux)                           │
//! │     ~/Library/Application Support/com.negociosmart.ventapro/...       │
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # ventapro.toml
//! [database]
//! path = "/srv/ventapro/store.db"
//! max_connections = 5
//! busy_timeout_ms = 5000
//! statement_timeout_secs = 30
//!
//! [startup]
//! initial_retry_ms = 500
//! max_retry_interval_secs = 10
//! max_retry_secs = 60   # 0 = never retry
//!
//! [logging]
//! filter = "info,ventapro=debug,sqlx=warn"
//! ```

use backoff::ExponentialBackoff;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use ventapro_db::DbConfig;

use crate::error::{AppError, AppResult};

/// Name of the config file inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "ventapro.toml";

/// Name of the database file inside the platform data directory.
pub const DATABASE_FILE_NAME: &str = "ventapro.db";

// =============================================================================
// Database Settings
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file. Defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Maximum pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long SQLite waits on a lock before reporting BUSY (milliseconds).
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,

    /// Deadline for one migration step (seconds).
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout() -> u64 {
    5_000
}

fn default_statement_timeout() -> u64 {
    30
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout(),
            statement_timeout_secs: default_statement_timeout(),
        }
    }
}

// =============================================================================
// Startup Settings
// =============================================================================

/// `[startup]` section: retrying transient migration failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartupSettings {
    /// First wait after a transient failure (milliseconds).
    #[serde(default = "default_initial_retry")]
    pub initial_retry_ms: u64,

    /// Longest single wait between attempts (seconds).
    #[serde(default = "default_max_retry_interval")]
    pub max_retry_interval_secs: u64,

    /// Total time spent retrying before giving up (seconds).
    /// Set to 0 to fail on the first transient error.
    #[serde(default = "default_max_retry")]
    pub max_retry_secs: u64,
}

fn default_initial_retry() -> u64 {
    500
}

fn default_max_retry_interval() -> u64 {
    10
}

fn default_max_retry() -> u64 {
    60
}

impl Default for StartupSettings {
    fn default() -> Self {
        StartupSettings {
            initial_retry_ms: default_initial_retry(),
            max_retry_interval_secs: default_max_retry_interval(),
            max_retry_secs: default_max_retry(),
        }
    }
}

impl StartupSettings {
    /// True when transient failures should be retried at all.
    pub fn retries_enabled(&self) -> bool {
        self.max_retry_secs > 0
    }

    /// Creates the exponential backoff for transient failures.
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: Duration::from_millis(self.initial_retry_ms),
            max_interval: Duration::from_secs(self.max_retry_interval_secs),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.max_retry_secs)),
            ..Default::default()
        }
    }
}

// =============================================================================
// Logging Settings
// =============================================================================

/// `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `tracing` filter directive. `RUST_LOG` still wins when set.
    #[serde(default)]
    pub filter: Option<String>,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub startup: StartupSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`ventapro.toml`)
    /// 3. Environment variables
    ///
    /// An explicitly given file must exist. The default file is optional.
    pub fn load(config_path: Option<PathBuf>) -> AppResult<Self> {
        let explicit = config_path.is_some();
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else if explicit {
                return Err(AppError::ConfigLoadFailed(format!(
                    "config file not found: {}",
                    path.display()
                )));
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Parses a config file body.
    pub fn from_toml(contents: &str) -> AppResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> AppResult<()> {
        if self.database.max_connections == 0 {
            return Err(AppError::InvalidConfig(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.database.statement_timeout_secs == 0 {
            return Err(AppError::InvalidConfig(
                "database.statement_timeout_secs must be greater than 0".into(),
            ));
        }

        if let Some(path) = &self.database.path {
            if path.as_os_str().is_empty() {
                return Err(AppError::InvalidConfig("database.path is empty".into()));
            }
        }

        if self.startup.retries_enabled() && self.startup.initial_retry_ms == 0 {
            return Err(AppError::InvalidConfig(
                "startup.initial_retry_ms must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    ///
    /// A set but malformed numeric variable is an error, not a silent default.
    fn apply_env_overrides(&mut self) -> AppResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> AppResult<()> {
        if let Some(path) = lookup("VENTAPRO_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(filter) = lookup("VENTAPRO_LOG") {
            self.logging.filter = Some(filter);
        }

        if let Some(secs) = lookup("VENTAPRO_STATEMENT_TIMEOUT_SECS") {
            self.database.statement_timeout_secs =
                parse_seconds("VENTAPRO_STATEMENT_TIMEOUT_SECS", &secs)?;
        }

        if let Some(secs) = lookup("VENTAPRO_MAX_RETRY_SECS") {
            self.startup.max_retry_secs = parse_seconds("VENTAPRO_MAX_RETRY_SECS", &secs)?;
        }

        Ok(())
    }

    /// Configured log filter (`[logging] filter` or `VENTAPRO_LOG`).
    pub fn log_filter(&self) -> Option<&str> {
        self.logging.filter.as_deref()
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "negociosmart", "ventapro")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Resolves the database file, creating the data directory if needed.
    ///
    /// ## Platform-Specific Defaults
    /// - **macOS**: `~/Library/Application Support/com.negociosmart.ventapro/ventapro.db`
    /// - **Windows**: `%APPDATA%\negociosmart\ventapro\data\ventapro.db`
    /// - **Linux**: `~/.local/share/ventapro/ventapro.db`
    pub fn database_path(&self) -> AppResult<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        let dirs = directories::ProjectDirs::from("com", "negociosmart", "ventapro").ok_or_else(
            || AppError::InvalidConfig("could not determine app data directory".into()),
        )?;

        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;
        Ok(data_dir.join(DATABASE_FILE_NAME))
    }

    /// Database settings for startup.
    ///
    /// Migrations are disabled on connect: startup runs them itself so it
    /// can retry transient failures.
    pub fn db_config(&self) -> AppResult<DbConfig> {
        Ok(DbConfig::new(self.database_path()?)
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
            .statement_timeout(Duration::from_secs(self.database.statement_timeout_secs))
            .run_migrations(false))
    }
}

fn parse_seconds(var: &str, value: &str) -> AppResult<u64> {
    value.trim().parse::<u64>().map_err(|_| {
        AppError::InvalidConfig(format!(
            "{var} must be a whole number of seconds, got '{value}'"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.database.statement_timeout_secs, 30);
        assert_eq!(config.startup.max_retry_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [database]
            path = "/srv/ventapro/store.db"

            [startup]
            max_retry_secs = 0
            "#,
        )
        .unwrap();

        assert_eq!(
            config.database.path,
            Some(PathBuf::from("/srv/ventapro/store.db"))
        );
        assert_eq!(config.database.busy_timeout_ms, 5_000);
        assert!(!config.startup.retries_enabled());
        assert_eq!(config.logging.filter, None);
    }

    #[test]
    fn test_malformed_file_is_rejected() {
        let err = AppConfig::from_toml("[database]\nmax_connections = \"many\"").unwrap_err();
        assert!(matches!(err, AppError::ConfigLoadFailed(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("VENTAPRO_DB_PATH", "/tmp/override.db"),
            ("VENTAPRO_LOG", "warn"),
            ("VENTAPRO_STATEMENT_TIMEOUT_SECS", "90"),
            ("VENTAPRO_MAX_RETRY_SECS", "0"),
        ]);

        let mut config = AppConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/override.db")));
        assert_eq!(config.log_filter(), Some("warn"));
        assert_eq!(config.database.statement_timeout_secs, 90);
        assert!(!config.startup.retries_enabled());
    }

    #[test]
    fn test_malformed_env_override_is_rejected() {
        for var in ["VENTAPRO_STATEMENT_TIMEOUT_SECS", "VENTAPRO_MAX_RETRY_SECS"] {
            let mut config = AppConfig::default();
            let err = config
                .apply_overrides(|key| (key == var).then(|| "not-a-number".to_string()))
                .unwrap_err();

            assert!(matches!(err, AppError::InvalidConfig(ref msg) if msg.contains(var)));
            assert_eq!(err.exit_code(), 2);
        }
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.database.statement_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.database.path = Some(PathBuf::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let result = AppConfig::load(Some(PathBuf::from("/nonexistent/ventapro.toml")));
        assert!(matches!(result, Err(AppError::ConfigLoadFailed(_))));
    }

    #[test]
    fn test_db_config_disables_auto_migrations() {
        let mut config = AppConfig::default();
        config.database.path = Some(PathBuf::from("/tmp/ventapro-test.db"));
        config.database.statement_timeout_secs = 45;

        let db = config.db_config().unwrap();
        assert!(!db.run_migrations);
        assert_eq!(db.statement_timeout, Duration::from_secs(45));
        assert_eq!(db.database_path, PathBuf::from("/tmp/ventapro-test.db"));
    }

    #[test]
    fn test_backoff_settings() {
        let startup = StartupSettings {
            initial_retry_ms: 250,
            max_retry_interval_secs: 4,
            max_retry_secs: 30,
        };
        let backoff = startup.backoff();
        assert_eq!(backoff.initial_interval, Duration::from_millis(250));
        assert_eq!(backoff.max_interval, Duration::from_secs(4));
        assert_eq!(backoff.max_elapsed_time, Some(Duration::from_secs(30)));
    }
}
