//! sidecar - runs and inspects the reasoning server sidecar
//!
//! # Examples
//!
//! ```bash
//! # Start the server and keep it healthy until Ctrl+C
//! sidecar run
//!
//! # Check that the server tool is installed
//! sidecar check
//!
//! # Show the effective configuration
//! sidecar --config-dir ./.sidecar config
//! ```

mod cli;
mod commands;
mod error;
mod logging;

#[cfg(test)]
mod tests;

use crate::cli::{Cli, Commands};

use std::process::ExitCode;

use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { json } => commands::run(cli.config_dir.as_deref(), json).await,
        Commands::Check => commands::check(cli.config_dir.as_deref())
            .await
            .map(|report| report.print()),
        Commands::Config => commands::show_config(cli.config_dir.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            if let Some(hint) = e.recovery_hint() {
                eprintln!();
                eprintln!("{hint}");
            }
            ExitCode::FAILURE
        }
    }
}
