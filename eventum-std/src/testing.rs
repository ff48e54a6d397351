//! Testing utilities for Eventum.
//!
//! - [`RecordingHandler`]: a listener handler that records every call and
//!   can be programmed to fail
//! - [`CountingHandler`]: a handler that only counts invocations
//! - [`CollectingLogger`]: an [`EventLogger`] capturing records for
//!   assertions

use crate::synth::EventInstance;
use eventum_core::{
    BoxError, EventLogger, ListenerCall, ListenerHandler, LogContext, Severity, Value,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// One recorded listener invocation.
pub struct RecordedCall {
    /// The bound instance, when the plan bound one.
    pub event: Option<EventInstance>,
    /// The plan-resolved arguments.
    pub arguments: Vec<Option<Value>>,
}

/// A handler that records all calls it receives.
pub struct RecordingHandler {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    fail_with: Arc<Mutex<Option<String>>>,
}

impl RecordingHandler {
    /// New recording handler that succeeds on every call.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: Arc::new(Mutex::new(None)),
        }
    }

    /// Make every subsequent call fail with `error`.
    pub fn fail_with(&self, error: impl Into<String>) {
        *self
            .fail_with
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(error.into());
    }

    /// Number of recorded calls.
    pub fn count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// The first argument of each recorded call, downcast to `T`.
    pub fn arguments_as<T: Clone + 'static>(&self) -> Vec<Option<T>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|call| call.arguments.first().and_then(|a| a.as_ref()).and_then(|v| v.get()))
            .collect()
    }
}

impl Default for RecordingHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RecordingHandler {
    fn clone(&self) -> Self {
        Self {
            calls: Arc::clone(&self.calls),
            fail_with: Arc::clone(&self.fail_with),
        }
    }
}

impl ListenerHandler<EventInstance> for RecordingHandler {
    async fn invoke(&self, call: ListenerCall<EventInstance>) -> Result<(), BoxError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                event: call.event,
                arguments: call.arguments,
            });
        if let Some(error) = self
            .fail_with
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Err(error.into());
        }
        Ok(())
    }
}

/// A handler that counts invocations.
pub struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    /// New counter at zero.
    pub fn new() -> Self {
        Self {
            count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The current count.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl Default for CountingHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for CountingHandler {
    fn clone(&self) -> Self {
        Self {
            count: Arc::clone(&self.count),
        }
    }
}

impl ListenerHandler<EventInstance> for CountingHandler {
    async fn invoke(&self, _call: ListenerCall<EventInstance>) -> Result<(), BoxError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// One captured log record.
#[derive(Clone, Debug)]
pub struct LogRecord {
    /// The message.
    pub message: String,
    /// The severity.
    pub severity: Severity,
}

/// An [`EventLogger`] that captures records for assertions.
pub struct CollectingLogger {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl CollectingLogger {
    /// New empty collector.
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Captured records.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of captured records at `severity`.
    pub fn count_at(&self, severity: Severity) -> usize {
        self.records()
            .iter()
            .filter(|r| r.severity == severity)
            .count()
    }
}

impl Default for CollectingLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for CollectingLogger {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl EventLogger for CollectingLogger {
    fn log(&self, message: &str, severity: Severity, _context: &LogContext) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LogRecord {
                message: message.to_string(),
                severity,
            });
    }
}
