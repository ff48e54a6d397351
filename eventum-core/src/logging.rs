//! The logging collaborator consumed by the engine.
//!
//! The core never logs directly; it hands messages to an [`EventLogger`]
//! together with a [`LogContext`] of ambient key/value state threaded
//! through dispatch calls (read-only from the engine's perspective, used to
//! tag log origin).

use std::collections::BTreeMap;

/// Message severity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Severity {
    /// Diagnostic detail.
    Debug,
    /// Normal operation.
    Info,
    /// Recoverable anomaly (e.g. contract diagnostics).
    Warn,
    /// Failure (e.g. a listener error).
    Error,
}

/// Ambient key/value state attached to log calls.
#[derive(Clone, Debug, Default)]
pub struct LogContext {
    entries: BTreeMap<String, String>,
}

impl LogContext {
    /// Empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Look up an entry.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether the context carries no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Logging collaborator. Invoked on listener failure and on contract
/// diagnostics; implementations decide the sink.
pub trait EventLogger: Send + Sync {
    /// Record one message.
    fn log(&self, message: &str, severity: Severity, context: &LogContext);
}

/// A logger that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLogger;

impl EventLogger for NoopLogger {
    fn log(&self, _message: &str, _severity: Severity, _context: &LogContext) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_entries() {
        let ctx = LogContext::new()
            .with("dispatcher", "test")
            .with("channel", "withdraw");
        assert_eq!(ctx.get("dispatcher"), Some("test"));
        assert_eq!(ctx.get("missing"), None);
        assert_eq!(ctx.iter().count(), 2);
        assert!(!ctx.is_empty());
    }
}
