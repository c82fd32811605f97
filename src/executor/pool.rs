use super::task::{Job, PoolKind};
use super::worker::Worker;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::shutdown::Interrupter;
use crate::sink::Reporter;
use crate::telemetry::{PoolStats, PoolStatsSnapshot};
use crossbeam_deque::{Injector, Steal};
use parking_lot::{Condvar, Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const RUNNING: u8 = 0;
const DRAINING: u8 = 1;
const STOPPED: u8 = 2;

/// Lifecycle of a [`WorkerPool`]. A stopped pool is never restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolState {
    Running,
    /// No longer accepting work; in-flight tasks may still be finishing.
    Draining,
    Stopped,
}

impl PoolState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            RUNNING => PoolState::Running,
            DRAINING => PoolState::Draining,
            _ => PoolState::Stopped,
        }
    }
}

/// State shared between a pool handle and its worker threads.
pub(crate) struct PoolShared {
    pub(crate) kind: PoolKind,
    pub(crate) source: String,
    pub(crate) injector: Injector<Job>,
    pub(crate) reporter: Reporter,
    pub(crate) stats: Arc<PoolStats>,
    state: AtomicU8,
    live: Mutex<usize>,
    terminated: Condvar,
}

impl PoolShared {
    pub(crate) fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == RUNNING
    }

    fn state(&self) -> PoolState {
        PoolState::from_raw(self.state.load(Ordering::Acquire))
    }

    fn transition(&self, from: u8, to: u8) -> bool {
        self.state
            .compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn worker_started(&self) {
        *self.live.lock() += 1;
    }

    pub(crate) fn worker_exited(&self) {
        let mut live = self.live.lock();
        *live = live.saturating_sub(1);
        if *live == 0 {
            self.transition(DRAINING, STOPPED);
            self.terminated.notify_all();
        }
    }
}

/// Fixed-size pool of named worker threads fed from one FIFO queue.
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    // submitters hold it shared, state changes hold it exclusively, so an
    // item is either queued before shutdown or refused after it
    admission: RwLock<()>,
    threads: Mutex<Vec<JoinHandle<()>>>,
    unparkers: Vec<thread::Thread>,
    next_wake: AtomicUsize,
    num_threads: usize,
}

impl WorkerPool {
    pub(crate) fn new(
        kind: PoolKind,
        config: &Config,
        reporter: Reporter,
        stats: Arc<PoolStats>,
    ) -> Result<Self> {
        let num_threads = config.workers(kind);
        if num_threads == 0 {
            return Err(Error::config("need at least 1 thread"));
        }

        let shared = Arc::new(PoolShared {
            kind,
            source: format!("{}-pool", kind),
            injector: Injector::new(),
            reporter,
            stats,
            state: AtomicU8::new(RUNNING),
            live: Mutex::new(0),
            terminated: Condvar::new(),
        });

        let mut threads = Vec::with_capacity(num_threads);
        let mut unparkers = Vec::with_capacity(num_threads);

        for id in 0..num_threads {
            let worker = Worker::new(id);
            let shared_clone = shared.clone();
            let name = format!("{}-{}-{}", config.thread_name_prefix, kind, id);

            let mut builder = thread::Builder::new().name(name);
            if let Some(stack_size) = config.stack_size {
                builder = builder.stack_size(stack_size);
            }

            shared.worker_started();
            match builder.spawn(move || worker.run(shared_clone)) {
                Ok(thread) => {
                    unparkers.push(thread.thread().clone());
                    threads.push(thread);
                }
                Err(e) => {
                    // tear down the workers that did start
                    shared.state.store(STOPPED, Ordering::Release);
                    shared.worker_exited();
                    for t in &unparkers {
                        t.unpark();
                    }
                    return Err(Error::executor(format!("spawn failed: {}", e)));
                }
            }
        }

        tracing::debug!(pool = %kind, workers = num_threads, "pool started");

        Ok(Self {
            shared,
            admission: RwLock::new(()),
            threads: Mutex::new(threads),
            unparkers,
            next_wake: AtomicUsize::new(0),
            num_threads,
        })
    }

    /// Queue a job, or hand it back if the pool no longer accepts work.
    pub(crate) fn try_execute(&self, job: Job) -> std::result::Result<(), Job> {
        {
            let _admission = self.admission.read();
            if !self.shared.is_running() {
                self.shared.stats.record_rejected();
                return Err(job);
            }
            self.shared.stats.record_submitted();
            self.shared.injector.push(job);
        }

        self.wake_one();
        Ok(())
    }

    /// Stop accepting work and discard everything still queued.
    ///
    /// Running tasks are left to finish. Returns the number of discarded jobs.
    pub fn shutdown(&self) -> usize {
        {
            let _admission = self.admission.write();
            if !self.shared.transition(RUNNING, DRAINING) {
                return 0;
            }
        }

        let discarded = self.discard_queue();
        self.wake_all();
        tracing::debug!(pool = %self.kind(), discarded, "pool shutting down");
        discarded
    }

    /// Stop accepting work and pull back every job that has not started,
    /// in submission order.
    pub(crate) fn shutdown_now(&self) -> Vec<Job> {
        let pending = {
            let _admission = self.admission.write();
            self.shared.transition(RUNNING, DRAINING);
            self.take_queue()
        };

        self.wake_all();
        tracing::debug!(pool = %self.kind(), pending = pending.len(), "pool stopped");
        pending
    }

    /// Wait until every worker has exited or `deadline` passes.
    ///
    /// Returns `Ok(true)` once terminated, `Ok(false)` on timeout, and
    /// [`Error::Interrupted`] if `interrupter` fires while waiting.
    pub fn await_termination(
        &self,
        deadline: Instant,
        interrupter: &Interrupter,
        poll: Duration,
    ) -> Result<bool> {
        {
            let mut live = self.shared.live.lock();
            while *live > 0 {
                if interrupter.take() {
                    return Err(Error::Interrupted);
                }
                let now = Instant::now();
                if now >= deadline {
                    return Ok(false);
                }
                let slice = (deadline - now).min(poll);
                self.shared.terminated.wait_for(&mut live, slice);
            }
        }

        for thread in self.threads.lock().drain(..) {
            let _ = thread.join();
        }
        Ok(true)
    }

    /// Mark the pool stopped, discard its queue and stop tracking its threads.
    ///
    /// Threads cannot be killed: a worker still inside a task finishes it
    /// detached and then exits. Returns the number of threads detached.
    pub fn force_terminate(&self) -> usize {
        {
            let _admission = self.admission.write();
            self.shared.state.store(STOPPED, Ordering::Release);
        }

        self.discard_queue();
        let detached = self.threads.lock().drain(..).count();
        self.wake_all();

        if detached > 0 {
            tracing::debug!(pool = %self.kind(), detached, "pool force-terminated");
        }
        detached
    }

    pub fn kind(&self) -> PoolKind {
        self.shared.kind
    }

    pub fn state(&self) -> PoolState {
        self.shared.state()
    }

    /// True once the pool stopped accepting work.
    pub fn is_shutdown(&self) -> bool {
        !self.shared.is_running()
    }

    pub fn is_terminated(&self) -> bool {
        self.shared.state() == PoolState::Stopped
    }

    /// Jobs waiting for a worker.
    pub fn queued(&self) -> usize {
        self.shared.injector.len()
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    pub fn stats(&self) -> PoolStatsSnapshot {
        self.shared.stats.snapshot()
    }

    pub(crate) fn source(&self) -> &str {
        &self.shared.source
    }

    pub(crate) fn reporter(&self) -> &Reporter {
        &self.shared.reporter
    }

    pub(crate) fn stats_handle(&self) -> &PoolStats {
        &self.shared.stats
    }

    fn take_queue(&self) -> Vec<Job> {
        let mut jobs = Vec::with_capacity(self.shared.injector.len());
        loop {
            match self.shared.injector.steal() {
                Steal::Success(job) => jobs.push(job),
                Steal::Empty => break,
                Steal::Retry => continue,
            }
        }
        jobs
    }

    fn discard_queue(&self) -> usize {
        // dropping a job resolves its handle as abandoned
        let discarded = self.take_queue().len();
        if discarded > 0 {
            self.shared.stats.record_abandoned(discarded);
        }
        discarded
    }

    fn wake_one(&self) {
        let idx = self.next_wake.fetch_add(1, Ordering::Relaxed) % self.unparkers.len();
        self.unparkers[idx].unpark();
    }

    fn wake_all(&self) {
        for t in &self.unparkers {
            t.unpark();
        }
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("kind", &self.kind())
            .field("state", &self.state())
            .field("num_threads", &self.num_threads)
            .field("queued", &self.queued())
            .finish()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if self.shared.is_running() {
            self.shared.state.store(STOPPED, Ordering::Release);
            self.discard_queue();
        }
        self.wake_all();
    }
}
