use crate::is_connection_error;

use std::panic::Location;
use std::result::Result as StdResult;

use error_location::ErrorLocation;
use thiserror::Error;

const NOT_CONNECTED_MESSAGE: &str = "MCP client is not connected";

/// Failure reported by a [`crate::ProtocolClient`].
///
/// Displays only the message, which is what connection classification reads.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ClientError {
    pub message: String,
    pub code: Option<String>,
    pub location: ErrorLocation,
}

impl ClientError {
    #[track_caller]
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            code: None,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn with_code<S: Into<String>, C: Into<String>>(message: S, code: C) -> Self {
        Self {
            message: message.into(),
            code: Some(code.into()),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn not_connected() -> Self {
        Self::new(NOT_CONNECTED_MESSAGE)
    }

    /// Whether this failure is a transport problem rather than a tool failure.
    pub fn is_connection_error(&self) -> bool {
        is_connection_error(Some(self))
    }
}

pub type ClientResult<T> = StdResult<T, ClientError>;
