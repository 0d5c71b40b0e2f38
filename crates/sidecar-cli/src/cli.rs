use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "sidecar")]
#[command(about = "Supervises the reasoning server used by the editor")]
#[command(version)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,

    /// Configuration directory (defaults to $SIDECAR_CONFIG_DIR, then ./.sidecar)
    #[arg(long, global = true)]
    pub(crate) config_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub(crate) enum Commands {
    /// Start the server and supervise it until interrupted
    Run {
        /// Print the server status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Verify that the server tool is installed and recent enough
    Check,

    /// Show the effective configuration
    Config,
}
