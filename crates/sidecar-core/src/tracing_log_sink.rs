use crate::{LogSink, SERVER_LOG_TARGET};

use tracing::info;

/// Forwards sink lines to `tracing` so they land in the process log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn append_line(&self, line: &str) {
        info!(target: SERVER_LOG_TARGET, "{line}");
    }
}
