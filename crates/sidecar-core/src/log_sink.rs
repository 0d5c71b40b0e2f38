use std::sync::Arc;

/// Append-only line sink for lifecycle, heartbeat and reconnect narration.
///
/// Every transition is written here with a stable phrase so the timeline can be
/// reconstructed from the sink alone.
pub trait LogSink: Send + Sync {
    fn append_line(&self, line: &str);
}

pub type SharedLogSink = Arc<dyn LogSink>;

impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    fn append_line(&self, line: &str) {
        (**self).append_line(line);
    }
}
