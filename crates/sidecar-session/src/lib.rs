//! Keeps a logical session with the reasoning server alive across transient
//! connection loss.
//!
//! [`ResilientSession`] wraps a [`ProtocolClient`]: it sends periodic
//! heartbeats, classifies call failures, reconnects a bounded number of times
//! and checkpoints the session through a [`SessionStateStore`] when every
//! attempt fails.

mod active_request_registry;
mod client_error;
mod connection_checkpoint;
mod connection_error;
mod error;
mod heartbeat_handle;
mod protocol_client;
mod reconnect_outcome;
mod reconnect_state;
mod request_id;
mod resilience_config;
mod resilient_session;
mod session_id;
mod session_state_store;
mod session_status;
mod store_error;

pub use active_request_registry::{ActiveRequest, ActiveRequestGuard, ActiveRequestRegistry};
pub use client_error::{ClientError, ClientResult};
pub use connection_checkpoint::ConnectionCheckpoint;
pub use connection_error::{CONNECTION_ERROR_SIGNATURES, is_connection_error};
pub use error::{SessionError, SessionResult};
pub use heartbeat_handle::HeartbeatHandle;
pub use protocol_client::ProtocolClient;
pub use reconnect_outcome::ReconnectOutcome;
pub use reconnect_state::ReconnectState;
pub use request_id::RequestId;
pub use resilience_config::ResilienceConfig;
pub use resilient_session::ResilientSession;
pub use session_id::SessionId;
pub use session_state_store::SessionStateStore;
pub use session_status::SessionStatus;
pub use store_error::{StoreError, StoreResult};

#[cfg(test)]
mod tests;
