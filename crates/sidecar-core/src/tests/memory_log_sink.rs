use crate::{LogSink, MemoryLogSink, SharedLogSink};

use std::sync::Arc;

#[test]
fn given_empty_sink_when_lines_then_empty() {
    let sink = MemoryLogSink::new();

    assert!(sink.lines().is_empty());
    assert!(!sink.contains("anything"));
}

#[test]
fn given_appended_lines_when_read_then_in_order() {
    let sink = MemoryLogSink::new();

    sink.append_line("Starting MCP server");
    sink.append_line("MCP server started");

    assert_eq!(
        sink.lines(),
        vec!["Starting MCP server".to_string(), "MCP server started".to_string()]
    );
}

#[test]
fn given_repeated_phrase_when_count_then_counts_every_line() {
    let sink = MemoryLogSink::new();

    sink.append_line("Reconnection attempt 1/3");
    sink.append_line("Reconnection attempt 1 failed: refused");
    sink.append_line("Reconnection attempt 2/3");

    assert_eq!(sink.count_containing("Reconnection attempt"), 3);
    assert_eq!(sink.count_containing("/3"), 2);
}

#[test]
fn given_shared_sink_when_appending_through_arc_then_visible_on_original() {
    let sink = Arc::new(MemoryLogSink::new());
    let shared: SharedLogSink = sink.clone();

    shared.append_line("Health check failed (1/3)");

    assert!(sink.contains("Health check failed (1/3)"));
}

#[test]
fn given_lines_when_cleared_then_empty() {
    let sink = MemoryLogSink::new();
    sink.append_line("line");

    sink.clear();

    assert!(sink.lines().is_empty());
}

#[test]
fn given_line_when_timestamped_then_prefixed() {
    let sink = MemoryLogSink::new();
    sink.append_line("MCP server stopped");

    let lines = sink.timestamped_lines();

    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with('['));
    assert!(lines[0].ends_with("] MCP server stopped"));
}
