//! Default logging collaborator backed by `tracing`.

use eventum_core::{EventLogger, LogContext, Severity};
use std::fmt::Write;

/// An [`EventLogger`] that forwards to the `tracing` macros, rendering the
/// ambient [`LogContext`] as a `context` field.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

fn render(context: &LogContext) -> String {
    let mut rendered = String::new();
    for (key, value) in context.iter() {
        if !rendered.is_empty() {
            rendered.push_str(", ");
        }
        // Writing to a String cannot fail.
        let _ = write!(rendered, "{key}={value}");
    }
    rendered
}

impl EventLogger for TracingLogger {
    fn log(&self, message: &str, severity: Severity, context: &LogContext) {
        let context = render(context);
        match severity {
            Severity::Debug => tracing::debug!(%context, "{message}"),
            Severity::Info => tracing::info!(%context, "{message}"),
            Severity::Warn => tracing::warn!(%context, "{message}"),
            Severity::Error => tracing::error!(%context, "{message}"),
        }
    }
}
