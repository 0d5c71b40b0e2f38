use std::panic::Location;
use std::result::Result as StdResult;
use std::sync::Arc;

use error_location::ErrorLocation;
use sidecar_config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("MCP server tool not installed or not accessible: {reason} {location}")]
    ToolMissing {
        reason: String,
        location: ErrorLocation,
    },

    #[error("Command failed: {message} {location}")]
    CommandFailed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid version '{value}' {location}")]
    InvalidVersion {
        value: String,
        location: ErrorLocation,
    },

    #[error("Failed to spawn MCP server: {message} {location}")]
    SpawnFailed {
        message: String,
        location: ErrorLocation,
    },

    #[error("MCP server failed to become ready within {timeout_secs}s {location}")]
    ReadinessTimeout {
        timeout_secs: u64,
        location: ErrorLocation,
    },

    #[error("MCP server exited during startup {location}")]
    ExitedDuringStartup { location: ErrorLocation },

    #[error("MCP server startup was cancelled {location}")]
    StartupCancelled { location: ErrorLocation },

    #[error("MCP server process error: {message} {location}")]
    ProcessError {
        message: String,
        location: ErrorLocation,
    },

    #[error("Auto-restart failed: {cause}")]
    AutoRestartFailed {
        cause: String,
        location: ErrorLocation,
    },

    #[error("Server settings unavailable: {source} {location}")]
    Settings {
        #[source]
        source: ConfigError,
        location: ErrorLocation,
    },

    #[error("Failed to signal pid {pid}: {message} {location}")]
    Signal {
        pid: u32,
        message: String,
        location: ErrorLocation,
    },

    #[error("IO error: {source} {location}")]
    Io {
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    /// Failure of a start attempt, shared by every caller that joined it.
    #[error("{source}")]
    StartFailed {
        #[source]
        source: Arc<SupervisorError>,
    },

    #[error("Supervisor has been disposed {location}")]
    Disposed { location: ErrorLocation },
}

impl SupervisorError {
    #[track_caller]
    pub fn tool_missing<S: Into<String>>(reason: S) -> Self {
        Self::ToolMissing {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn command_failed<S: Into<String>>(message: S) -> Self {
        Self::CommandFailed {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn invalid_version<S: Into<String>>(value: S) -> Self {
        Self::InvalidVersion {
            value: value.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn spawn_failed<S: Into<String>>(message: S) -> Self {
        Self::SpawnFailed {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn readiness_timeout(timeout_secs: u64) -> Self {
        Self::ReadinessTimeout {
            timeout_secs,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn exited_during_startup() -> Self {
        Self::ExitedDuringStartup {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn startup_cancelled() -> Self {
        Self::StartupCancelled {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn process_error<S: Into<String>>(message: S) -> Self {
        Self::ProcessError {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn auto_restart_failed<S: Into<String>>(cause: S) -> Self {
        Self::AutoRestartFailed {
            cause: cause.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn settings(source: ConfigError) -> Self {
        Self::Settings {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn signal<S: Into<String>>(pid: u32, message: S) -> Self {
        Self::Signal {
            pid,
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn disposed() -> Self {
        Self::Disposed {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn start_failed(source: Arc<SupervisorError>) -> Self {
        Self::StartFailed { source }
    }

    /// The underlying failure, looking through shared start failures.
    pub fn root_cause(&self) -> &SupervisorError {
        match self {
            Self::StartFailed { source } => source.root_cause(),
            other => other,
        }
    }

    /// Stable machine-readable code, surfaced in [`crate::StatusError`].
    pub fn code(&self) -> &'static str {
        match self.root_cause() {
            Self::ToolMissing { .. } => "TOOL_MISSING",
            Self::CommandFailed { .. } => "COMMAND_FAILED",
            Self::InvalidVersion { .. } => "INVALID_VERSION",
            Self::SpawnFailed { .. } => "SPAWN_FAILED",
            Self::ReadinessTimeout { .. } => "READINESS_TIMEOUT",
            Self::ExitedDuringStartup { .. } => "EXITED_DURING_STARTUP",
            Self::StartupCancelled { .. } => "STARTUP_CANCELLED",
            Self::ProcessError { .. } => "PROCESS_ERROR",
            Self::AutoRestartFailed { .. } => "AUTO_RESTART_FAILED",
            Self::Settings { .. } => "SETTINGS_INVALID",
            Self::Signal { .. } => "SIGNAL_FAILED",
            Self::Io { .. } => "IO_ERROR",
            Self::Disposed { .. } => "DISPOSED",
            Self::StartFailed { .. } => "START_FAILED",
        }
    }

    pub fn recovery_hint(&self) -> &'static str {
        match self.root_cause() {
            Self::ToolMissing { .. } => {
                "Install the reasoning server and make sure it is on your PATH, \
                   or set server.program in the sidecar config."
            }
            Self::InvalidVersion { .. } => {
                "Check server.min_version in the sidecar config; \
                   it must look like MAJOR.MINOR.PATCH."
            }
            Self::SpawnFailed { .. } => {
                "The server could not be launched. \
                   Check server.program and server.args in the sidecar config."
            }
            Self::ReadinessTimeout { .. } => {
                "The server is taking too long to start. \
                   Check the server logs or increase supervisor.startup_timeout_secs."
            }
            Self::ExitedDuringStartup { .. } => {
                "The server exited right after launch. \
                   Check the server logs for the reason."
            }
            Self::AutoRestartFailed { .. } | Self::ProcessError { .. } => {
                "The server keeps failing. \
                   Please report this issue with the diagnostic logs."
            }
            Self::Settings { .. } => "Fix the sidecar configuration file and try again.",
            _ => "Check the logs for details.",
        }
    }
}

impl From<std::io::Error> for SupervisorError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type SupervisorResult<T> = StdResult<T, SupervisorError>;
