//! Lifecycle supervision for the local reasoning (MCP) server process.
//!
//! [`ProcessSupervisor`] owns the child process: it verifies the tool is
//! installed, spawns it, waits until it accepts connections, probes it
//! periodically and restarts it after repeated probe failures. All process
//! I/O goes through the [`ProcessLauncher`] and [`HealthProbe`] seams.

mod command_launcher;
mod error;
mod guidance;
mod health;
mod process;
mod server_settings;
mod server_state;
mod server_status;
mod settings_provider;
mod supervisor;
mod supervisor_builder;
mod supervisor_command;
mod supervisor_timing;
mod tool_version;

pub use command_launcher::CommandLauncher;
pub use error::{SupervisorError, SupervisorResult};
pub use guidance::{
    GuidanceAction, GuidanceNotifier, INSTALL_GUIDE_URL, LogGuidanceNotifier,
    SYSTEM_REQUIREMENTS_URL, SetupGuidance,
};
pub use health::{HealthProbe, TcpHealthProbe};
pub use process::{ProcessEvent, ProcessLauncher, ServerProcess, SpawnedProcess};
pub use server_settings::ServerSettings;
pub use server_state::ServerState;
pub use server_status::{ServerStatus, StatusError};
pub use settings_provider::{ConfigSettingsProvider, SettingsProvider};
pub use supervisor::ProcessSupervisor;
pub use supervisor_builder::SupervisorBuilder;
pub use supervisor_command::SupervisorCommand;
pub use supervisor_timing::SupervisorTiming;
pub use tool_version::ToolVersion;

#[cfg(test)]
mod tests;

/// Buffer size for process output/exit events.
const PROCESS_EVENT_BUFFER: usize = 256;

/// Buffer size for the health monitor -> command handler channel.
const COMMAND_BUFFER: usize = 16;

/// Loopback host the server binds to.
const SERVER_HOST: &str = "127.0.0.1";
