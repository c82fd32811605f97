//! Outbound collaborators: where task failures and status lines go.

use crate::executor::TaskError;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

/// One task failure, as handed to an [`ErrorSink`].
#[derive(Debug, Clone, Copy)]
pub struct ErrorRecord<'a> {
    pub severity: Severity,
    /// Component that ran (or refused) the work, e.g. `"critical-pool"`.
    pub source: &'a str,
    pub cause: &'a TaskError,
}

/// Receives task failures from any worker thread or the shutdown thread.
///
/// Implementations must not panic and must tolerate concurrent calls; the
/// executor adds no locking of its own around them.
pub trait ErrorSink: Send + Sync {
    fn report(&self, record: &ErrorRecord<'_>);
}

/// Receives the human-readable shutdown summary lines.
pub trait StatusLog: Send + Sync {
    fn info(&self, message: &str);
}

/// Forwards everything to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, record: &ErrorRecord<'_>) {
        match record.severity {
            Severity::Warning => {
                tracing::warn!(source = record.source, error = %record.cause, "task failed")
            }
            Severity::Error => {
                tracing::error!(source = record.source, error = %record.cause, "task failed")
            }
        }
    }
}

impl StatusLog for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ErrorSink for NullSink {
    fn report(&self, _: &ErrorRecord<'_>) {}
}

impl StatusLog for NullSink {
    fn info(&self, _: &str) {}
}

/// The pair of collaborators an executor reports through.
#[derive(Clone)]
pub struct Reporter {
    errors: Arc<dyn ErrorSink>,
    status: Arc<dyn StatusLog>,
}

impl Reporter {
    pub fn new(errors: Arc<dyn ErrorSink>, status: Arc<dyn StatusLog>) -> Self {
        Self { errors, status }
    }

    /// Use one object for both failures and status lines.
    pub fn shared<S>(sink: Arc<S>) -> Self
    where
        S: ErrorSink + StatusLog + 'static,
    {
        Self {
            errors: sink.clone(),
            status: sink,
        }
    }

    pub fn tracing() -> Self {
        Self::shared(Arc::new(TracingSink))
    }

    pub fn report(&self, record: &ErrorRecord<'_>) {
        self.errors.report(record);
    }

    pub fn info(&self, message: &str) {
        self.status.info(message);
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::tracing()
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter").finish_non_exhaustive()
    }
}
