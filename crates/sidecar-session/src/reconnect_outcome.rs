/// How a call to `handle_connection_loss` ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectOutcome {
    /// Connected again on the given attempt (1-based)
    Reconnected { attempt: u32 },
    /// Every attempt failed; the session was checkpointed and marked failed
    Exhausted,
    /// Another reconnection sequence is already running
    AlreadyReconnecting,
    /// The session was disposed before or during the sequence
    Disposed,
}
