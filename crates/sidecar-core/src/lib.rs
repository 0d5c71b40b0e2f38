//! Shared building blocks for the sidecar workspace.

mod log_sink;
mod memory_log_sink;
mod tracing_log_sink;

pub use log_sink::{LogSink, SharedLogSink};
pub use memory_log_sink::MemoryLogSink;
pub use tracing_log_sink::TracingLogSink;

#[cfg(test)]
mod tests;

/// `tracing` target used for lines narrated through a [`LogSink`].
pub const SERVER_LOG_TARGET: &str = "sidecar::server";
