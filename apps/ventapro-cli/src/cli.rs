//! Command line interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// VentaPro point of sale: database startup and schema maintenance
#[derive(Clone, Debug, Parser)]
#[command(name = "ventapro", version, about)]
pub struct Cli {
    /// Config file (default: ventapro.toml in the platform config directory)
    #[arg(long, global = true, env = "VENTAPRO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database file, overriding config and environment
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Clone, Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Apply pending migrations (the default)
    Migrate,

    /// Show every migration and whether it is applied
    Status {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Revert the latest applied migration
    Revert {
        /// Version to revert, e.g. 1.0.4
        version: String,
    },
}

impl Cli {
    /// The subcommand to run, defaulting to `migrate`.
    pub fn action(&self) -> Command {
        self.command.clone().unwrap_or(Command::Migrate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_migrate_is_default() {
        let cli = Cli::try_parse_from(["ventapro"]).unwrap();
        assert_eq!(cli.action(), Command::Migrate);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["ventapro", "status", "--json", "--db", "/tmp/a.db"]).unwrap();
        assert_eq!(cli.action(), Command::Status { json: true });
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/a.db")));
    }

    #[test]
    fn test_revert_requires_version() {
        assert!(Cli::try_parse_from(["ventapro", "revert"]).is_err());

        let cli = Cli::try_parse_from(["ventapro", "revert", "1.0.4"]).unwrap();
        assert_eq!(
            cli.action(),
            Command::Revert {
                version: "1.0.4".to_string()
            }
        );
    }
}
