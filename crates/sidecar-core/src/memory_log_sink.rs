use crate::LogSink;

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};

/// In-memory sink that keeps every line it receives.
///
/// Used by embedders that surface the log in their own UI, and by tests that
/// assert on the narrated timeline.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    lines: Mutex<Vec<(DateTime<Utc>, String)>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All lines received so far, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, line)| line.clone())
            .collect()
    }

    /// Lines prefixed with the time they were appended.
    pub fn timestamped_lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(at, line)| format!("[{}] {}", at.to_rfc3339(), line))
            .collect()
    }

    /// Number of lines containing `phrase`.
    pub fn count_containing(&self, phrase: &str) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, line)| line.contains(phrase))
            .count()
    }

    pub fn contains(&self, phrase: &str) -> bool {
        self.count_containing(phrase) > 0
    }

    pub fn clear(&self) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl LogSink for MemoryLogSink {
    fn append_line(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((Utc::now(), line.to_string()));
    }
}
