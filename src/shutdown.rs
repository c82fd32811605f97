//! Shutdown outcome reporting and the interrupt signal for blocked waits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cloneable signal that aborts an in-progress `disable()` wait.
///
/// An interrupt raised while nothing is waiting stays pending and is
/// consumed by the next wait; `Executor::enable` clears it.
#[derive(Debug, Clone, Default)]
pub struct Interrupter {
    flag: Arc<AtomicBool>,
}

impl Interrupter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    pub fn clear(&self) {
        self.flag.store(false, Ordering::Release);
    }

    /// Consume a pending interrupt.
    pub(crate) fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }
}

/// What `disable()` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Critical items pulled from the queue and run on the disabling thread.
    pub drained_critical: usize,
    /// How many of those drained items failed.
    pub drain_failures: usize,
    /// Queued bulk items dropped without running.
    pub discarded_bulk: usize,
    /// The bulk pool outlived the shutdown timeout and was forced down.
    pub bulk_forced: bool,
    /// The critical pool still had a task in flight when it was forced down.
    pub critical_forced: bool,
    pub elapsed: Duration,
}
