use std::time::Duration;

/// Progress of the reconnection sequence of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectState {
    /// Guards against overlapping sequences
    pub is_reconnecting: bool,
    /// Attempts made in the current sequence; 0 after success or a new start
    pub attempts: u32,
    pub max_attempts: u32,
    pub interval: Duration,
}

impl ReconnectState {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            is_reconnecting: false,
            attempts: 0,
            max_attempts,
            interval,
        }
    }
}
