//! Logger capability used by the worker.
//!
//! Templates carry named `{placeholder}` fields instead of embedded values so
//! structured backends can pick the fields up. [`TracingLogger`] is the
//! production sink; [`MemoryLogger`] records entries for tests.

use std::sync::{Mutex, PoisonError};

pub use tracing::Level;

/// Sink for worker log lines.
pub trait Logger: Send + Sync + 'static {
    fn log(&self, level: Level, template: &str, context: &[(&str, String)]);
}

/// Substitute `{key}` placeholders in `template` with values from `context`.
///
/// The template is scanned once, so substituted values are never expanded
/// again. Unknown placeholders are left as they are.
pub fn render(template: &str, context: &[(&str, String)]) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        rendered.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(end) = tail.find('}') else {
            rest = tail;
            break;
        };

        let key = &tail[1..end];
        match context.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => rendered.push_str(value),
            None => rendered.push_str(&tail[..=end]),
        }
        rest = &tail[end + 1..];
    }

    rendered.push_str(rest);
    rendered
}

/// Forwards log lines to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: Level, template: &str, context: &[(&str, String)]) {
        let message = render(template, context);
        match level {
            Level::ERROR => tracing::error!(template, context = ?context, "{}", message),
            Level::WARN => tracing::warn!(template, context = ?context, "{}", message),
            Level::INFO => tracing::info!(template, context = ?context, "{}", message),
            Level::DEBUG => tracing::debug!(template, context = ?context, "{}", message),
            _ => tracing::trace!(template, context = ?context, "{}", message),
        }
    }
}

/// A recorded log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    /// Template as passed by the caller.
    pub template: String,
    /// Template with the context substituted.
    pub message: String,
    pub context: Vec<(String, String)>,
}

/// Keeps every log line in memory.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries logged so far, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rendered messages logged so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.message).collect()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: Level, template: &str, context: &[(&str, String)]) {
        let entry = LogEntry {
            level,
            template: template.to_string(),
            message: render(template, context),
            context: context
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}
