use crate::{ClientError, RequestId, SessionId};

use std::panic::Location;
use std::result::Result as StdResult;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// Logical failure of the tool itself; the connection is fine
    #[error("Tool call failed: {source} {location}")]
    Tool {
        #[source]
        source: ClientError,
        location: ErrorLocation,
    },

    #[error("Failed to connect to MCP server: {source} {location}")]
    ConnectFailed {
        #[source]
        source: ClientError,
        location: ErrorLocation,
    },

    /// The call failed on the transport; the session reconnected or is reconnecting
    #[error("Connection lost: {source} {location}")]
    ConnectionLost {
        #[source]
        source: ClientError,
        location: ErrorLocation,
    },

    #[error("Connection lost and {attempts} reconnection attempts failed {location}")]
    ReconnectExhausted {
        attempts: u32,
        location: ErrorLocation,
    },

    #[error("Tool '{tool}' did not respond within {timeout_secs}s {location}")]
    CallTimeout {
        tool: String,
        timeout_secs: u64,
        location: ErrorLocation,
    },

    #[error("Request {request_id} was cancelled {location}")]
    Cancelled {
        request_id: RequestId,
        location: ErrorLocation,
    },

    /// Another call with the same id is still in flight
    #[error("Request {request_id} is already in flight {location}")]
    DuplicateRequest {
        request_id: RequestId,
        location: ErrorLocation,
    },

    /// `start()` was called while a reconnection sequence owns the connection
    #[error("Session {session_id} is reconnecting {location}")]
    Reconnecting {
        session_id: SessionId,
        location: ErrorLocation,
    },

    #[error("Session {session_id} is closed {location}")]
    SessionClosed {
        session_id: SessionId,
        location: ErrorLocation,
    },
}

impl SessionError {
    #[track_caller]
    pub fn tool(source: ClientError) -> Self {
        Self::Tool {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn connect_failed(source: ClientError) -> Self {
        Self::ConnectFailed {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn connection_lost(source: ClientError) -> Self {
        Self::ConnectionLost {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn reconnect_exhausted(attempts: u32) -> Self {
        Self::ReconnectExhausted {
            attempts,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn call_timeout<S: Into<String>>(tool: S, timeout_secs: u64) -> Self {
        Self::CallTimeout {
            tool: tool.into(),
            timeout_secs,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn cancelled(request_id: RequestId) -> Self {
        Self::Cancelled {
            request_id,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn duplicate_request(request_id: RequestId) -> Self {
        Self::DuplicateRequest {
            request_id,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn reconnecting(session_id: SessionId) -> Self {
        Self::Reconnecting {
            session_id,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn session_closed(session_id: SessionId) -> Self {
        Self::SessionClosed {
            session_id,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// The session will not accept further calls after this error.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::ReconnectExhausted { .. } | Self::SessionClosed { .. }
        )
    }
}

pub type SessionResult<T> = StdResult<T, SessionError>;
