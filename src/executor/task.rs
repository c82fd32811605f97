//! Work items, their importance class, and the internal job wrapper.

use super::panic_handler::{self, PanicInfo};
use crate::error::{Error, Result};
use crate::sink::{ErrorRecord, Reporter, Severity};
use crate::telemetry::PoolStats;
use crossbeam_channel::Sender;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Global task ID counter
static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a submitted job
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        TaskId(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// How much a work item's completion matters at shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Importance {
    /// Must run: if still queued at shutdown it is executed synchronously.
    Critical,
    /// Best effort: dropped if the executor stops before it starts.
    #[default]
    NonCritical,
}

impl Importance {
    /// The pool that serves this class of work.
    pub fn pool_kind(self) -> PoolKind {
        match self {
            Importance::Critical => PoolKind::Critical,
            Importance::NonCritical => PoolKind::Bulk,
        }
    }
}

/// The two worker pools owned by an executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    Bulk,
    Critical,
}

impl PoolKind {
    pub fn name(self) -> &'static str {
        match self {
            PoolKind::Bulk => "bulk",
            PoolKind::Critical => "critical",
        }
    }

    /// Severity used when a task of this pool fails.
    pub fn severity(self) -> Severity {
        match self {
            PoolKind::Bulk => Severity::Warning,
            PoolKind::Critical => Severity::Error,
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub type TaskResult<T> = std::result::Result<T, TaskError>;

/// Why a work item did not produce a value.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("{0}")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error("panicked: {0}")]
    Panicked(PanicInfo),

    #[error("{pool} pool is not accepting work")]
    Rejected { pool: PoolKind },
}

impl TaskError {
    pub fn failed<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        TaskError::Failed(err.into())
    }
}

type Action<T> = Box<dyn FnOnce() -> TaskResult<T> + Send + 'static>;

/// A unit of work tagged with its importance.
///
/// `WorkItem<()>` is the fire-and-forget shape; any other `T` is a
/// value-producing action whose result can be observed through a
/// [`ResultHandle`](super::ResultHandle).
pub struct WorkItem<T = ()> {
    importance: Importance,
    action: Action<T>,
}

impl<T: Send + 'static> WorkItem<T> {
    pub fn new<F>(importance: Importance, f: F) -> Self
    where
        F: FnOnce() -> TaskResult<T> + Send + 'static,
    {
        WorkItem {
            importance,
            action: Box::new(f),
        }
    }

    pub fn critical<F>(f: F) -> Self
    where
        F: FnOnce() -> TaskResult<T> + Send + 'static,
    {
        Self::new(Importance::Critical, f)
    }

    pub fn non_critical<F>(f: F) -> Self
    where
        F: FnOnce() -> TaskResult<T> + Send + 'static,
    {
        Self::new(Importance::NonCritical, f)
    }

    /// Critical item from an infallible closure.
    pub fn critical_fn<F>(f: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Self::critical(move || Ok(f()))
    }

    /// Non-critical item from an infallible closure.
    pub fn non_critical_fn<F>(f: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Self::non_critical(move || Ok(f()))
    }

    pub fn importance(&self) -> Importance {
        self.importance
    }

    pub fn is_critical(&self) -> bool {
        self.importance == Importance::Critical
    }
}

impl<T> fmt::Debug for WorkItem<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem")
            .field("importance", &self.importance)
            .finish_non_exhaustive()
    }
}

/// Where and how a job is being run.
pub(crate) struct RunContext<'a> {
    pub(crate) kind: PoolKind,
    pub(crate) source: &'a str,
    pub(crate) reporter: &'a Reporter,
    pub(crate) stats: &'a PoolStats,
}

impl RunContext<'_> {
    fn settle<T>(&self, outcome: &TaskResult<T>) {
        match outcome {
            Ok(_) => self.stats.record_completed(),
            Err(cause) => {
                self.stats.record_failed();
                self.reporter.report(&ErrorRecord {
                    severity: self.kind.severity(),
                    source: self.source,
                    cause,
                });
            }
        }
    }
}

/// Internal job representation: a work item bound to its result channel.
///
/// Dropping a job without running it disconnects the channel, which the
/// handle observes as [`Error::Abandoned`].
pub(crate) struct Job {
    pub(crate) id: TaskId,
    pub(crate) kind: PoolKind,
    pub(crate) enqueue_time: Instant,
    body: JobBody,
}

type JobBody = Box<dyn FnOnce(&RunContext<'_>) -> bool + Send + 'static>;

fn job_body<F>(f: F) -> JobBody
where
    F: FnOnce(&RunContext<'_>) -> bool + Send + 'static,
{
    Box::new(f)
}

impl Job {
    pub(crate) fn new<T: Send + 'static>(
        kind: PoolKind,
        item: WorkItem<T>,
        tx: Option<Sender<Result<T>>>,
    ) -> Self {
        let action = item.action;

        Job {
            id: TaskId::next(),
            kind,
            enqueue_time: Instant::now(),
            body: job_body(move |ctx| {
                let outcome = panic_handler::guard(action);
                // report before resolving so observers of the handle also see the record
                ctx.settle(&outcome);
                let ok = outcome.is_ok();
                if let Some(tx) = tx {
                    let _ = tx.send(outcome.map_err(Error::from));
                }
                ok
            }),
        }
    }

    /// Run the job inside the failure wrapper. Returns whether it succeeded.
    pub(crate) fn run(self, ctx: &RunContext<'_>) -> bool {
        (self.body)(ctx)
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("enqueue_time", &self.enqueue_time)
            .finish()
    }
}
