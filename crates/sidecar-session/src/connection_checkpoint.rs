use crate::RequestId;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session state saved when reconnection is exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionCheckpoint {
    pub disconnected_at: DateTime<Utc>,
    /// The failure that started the reconnection sequence
    pub error: String,
    pub reconnect_attempts: u32,
    /// Requests in flight when the connection was lost
    pub active_requests: Vec<RequestId>,
}
