use std::panic::Location;
use std::result::Result as StdResult;

use error_location::ErrorLocation;
use sidecar_config::ConfigError;
use sidecar_supervisor::SupervisorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum CliError {
    #[error("{source}")]
    Config {
        #[source]
        source: ConfigError,
        location: ErrorLocation,
    },

    #[error("{source}")]
    Supervisor {
        #[source]
        source: SupervisorError,
        location: ErrorLocation,
    },

    #[error("Logging setup failed: {message} {location}")]
    Logging {
        message: String,
        location: ErrorLocation,
    },

    #[error("Signal handling failed: {message} {location}")]
    Signal {
        message: String,
        location: ErrorLocation,
    },

    #[error("Failed to render output: {message} {location}")]
    Output {
        message: String,
        location: ErrorLocation,
    },
}

impl CliError {
    #[track_caller]
    pub(crate) fn logging<S: Into<String>>(message: S) -> Self {
        Self::Logging {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn signal<S: Into<String>>(message: S) -> Self {
        Self::Signal {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn output<S: Into<String>>(message: S) -> Self {
        Self::Output {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// What the user can do about it, when there is something to say.
    pub(crate) fn recovery_hint(&self) -> Option<&'static str> {
        match self {
            CliError::Supervisor { source, .. } => Some(source.recovery_hint()),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    #[track_caller]
    fn from(source: ConfigError) -> Self {
        Self::Config {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<SupervisorError> for CliError {
    #[track_caller]
    fn from(source: SupervisorError) -> Self {
        Self::Supervisor {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub(crate) type CliResult<T> = StdResult<T, CliError>;
