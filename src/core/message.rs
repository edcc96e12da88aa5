//! Log message value type and header formatting

use super::severity::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};

// Thread ids from `std::thread` are opaque, so every thread gets a small
// sequential id from a global counter, cached thread-locally on first use.
static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID_CACHE: Cell<u64> = const { Cell::new(0) };
}

/// Get the calling thread's pipeline-local id, assigning one on first access.
pub(crate) fn current_thread_id() -> u64 {
    THREAD_ID_CACHE.with(|cache| {
        let mut id = cache.get();
        if id == 0 {
            id = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
            cache.set(id);
        }
        id
    })
}

/// Header layout selector for rendered lines.
///
/// `ThreadTime` includes the capture timestamp and process/thread identity;
/// `TagOnly` keeps just severity and tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputMode {
    /// `[{HH:MM:SS.mmm}][{SEVERITY}][{pid}/{tid}] {tag}`
    #[default]
    ThreadTime,
    /// `[{SEVERITY}] {tag}`
    TagOnly,
}

/// One immutable log message.
///
/// Severity, process id, thread id and timestamp are captured at the moment
/// of construction, which is submission time rather than drain time. A
/// message is never mutated after creation; ownership moves from the output
/// queue to the consumer on pop and ends at flush.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogMessage {
    pub severity: Severity,
    pub process_id: u32,
    pub thread_id: u64,
    pub tag: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl LogMessage {
    /// Sanitize message text to keep one log line per message.
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences so
    /// a crafted message cannot forge additional log entries.
    fn sanitize(text: &str) -> String {
        text.replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    /// Build a real message, capturing the calling process and thread identity.
    ///
    /// # Panics
    ///
    /// Debug builds assert that `severity` is not the [`Severity::None`]
    /// sentinel; release builds accept it (the pipeline discards such
    /// messages with a warning instead).
    pub fn new(severity: Severity, tag: impl Into<String>, text: impl Into<String>) -> Self {
        debug_assert!(!severity.is_none(), "real messages never carry Severity::None");
        Self {
            severity,
            process_id: std::process::id(),
            thread_id: current_thread_id(),
            tag: tag.into(),
            text: Self::sanitize(&text.into()),
            timestamp: Utc::now(),
        }
    }

    /// The "no message available" sentinel returned by an empty-queue pop.
    pub fn none() -> Self {
        Self {
            severity: Severity::None,
            process_id: 0,
            thread_id: 0,
            tag: String::new(),
            text: String::new(),
            timestamp: Utc::now(),
        }
    }

    /// Whether this is the empty-queue sentinel.
    #[inline]
    pub fn is_none(&self) -> bool {
        self.severity.is_none()
    }

    /// Render the header portion of this message for the given mode.
    pub fn header_line(&self, mode: OutputMode) -> String {
        match mode {
            OutputMode::ThreadTime => format!(
                "[{}][{:>7}][{}/{}] {}",
                self.timestamp.format("%H:%M:%S%.3f"),
                self.severity.as_str(),
                self.process_id,
                self.thread_id,
                self.tag
            ),
            OutputMode::TagOnly => {
                format!("[{:>7}] {}", self.severity.as_str(), self.tag)
            }
        }
    }

    /// Render the full line: header, `": "`, message text.
    pub fn log_line(&self, mode: OutputMode) -> String {
        format!("{}: {}", self.header_line(mode), self.text)
    }
}
