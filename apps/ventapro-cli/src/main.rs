//! # VentaPro Entry Point
//!
//! ```text
//! ventapro                      # migrate (default)
//! ventapro status --json
//! ventapro revert 1.0.4
//! ventapro --db ./store.db migrate
//! ```
//!
//! Exits non-zero when startup halts; see [`ventapro::error`] for codes.

use clap::Parser;
use std::process::ExitCode;
use ventapro::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match ventapro::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Logging may not be up yet if configuration failed
            eprintln!("ventapro: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
