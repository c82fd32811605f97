use crate::config::Config;
use crate::error::Result;
use crate::executor::{
    Importance, Job, PoolKind, PoolState, ResultHandle, RunContext, TaskError, WorkItem,
    WorkerPool,
};
use crate::shutdown::{Interrupter, ShutdownReport};
use crate::sink::{ErrorRecord, Reporter};
use crate::telemetry::{ExecutorStats, PoolStats};
use crossbeam_channel::Sender;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Source name attached to failures of critical items run during shutdown.
pub const DRAIN_SOURCE: &str = "shutdown-drain";

/// Dual-priority task executor.
///
/// Owns a bulk pool for best-effort work and a smaller critical pool for
/// work that must not be silently dropped. Construct it once and pass a
/// reference (or an `Arc`) to whatever needs to submit work.
pub struct Executor {
    config: Config,
    reporter: Reporter,
    bulk: RwLock<Arc<WorkerPool>>,
    critical: RwLock<Arc<WorkerPool>>,
    bulk_stats: Arc<PoolStats>,
    critical_stats: Arc<PoolStats>,
    interrupter: Interrupter,
}

impl Executor {
    pub fn new(config: Config, reporter: Reporter) -> Result<Self> {
        config.validate()?;

        let bulk_stats = Arc::new(PoolStats::new());
        let critical_stats = Arc::new(PoolStats::new());
        let bulk = WorkerPool::new(
            PoolKind::Bulk,
            &config,
            reporter.clone(),
            bulk_stats.clone(),
        )?;
        let critical = WorkerPool::new(
            PoolKind::Critical,
            &config,
            reporter.clone(),
            critical_stats.clone(),
        )?;

        Ok(Self {
            config,
            reporter,
            bulk: RwLock::new(Arc::new(bulk)),
            critical: RwLock::new(Arc::new(critical)),
            bulk_stats,
            critical_stats,
            interrupter: Interrupter::new(),
        })
    }

    /// Default sizing, failures and status lines logged through `tracing`.
    pub fn with_defaults() -> Result<Self> {
        Self::new(Config::default(), Reporter::default())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Route a fire-and-forget item by its importance tag.
    pub fn submit(&self, item: impl Into<Option<WorkItem>>) {
        let Some(item) = item.into() else { return };
        match item.importance() {
            Importance::Critical => self.submit_critical(item),
            Importance::NonCritical => self.submit_non_critical(item),
        }
    }

    /// Route a value-producing item by its importance tag.
    pub fn submit_with_handle<T>(&self, item: impl Into<Option<WorkItem<T>>>) -> ResultHandle<T>
    where
        T: Send + 'static,
    {
        let Some(item) = item.into() else {
            return ResultHandle::rejected();
        };
        match item.importance() {
            Importance::Critical => self.submit_critical_with_handle(item),
            Importance::NonCritical => self.submit_non_critical_with_handle(item),
        }
    }

    /// Queue on the bulk pool. Silently ignored once the pool is stopped.
    pub fn submit_non_critical(&self, item: impl Into<Option<WorkItem>>) {
        if let Some(item) = item.into() {
            self.dispatch(PoolKind::Bulk, item, None);
        }
    }

    /// Queue on the bulk pool. Once the pool is stopped the handle comes
    /// back already resolved with [`Error::Rejected`](crate::Error::Rejected).
    pub fn submit_non_critical_with_handle<T>(
        &self,
        item: impl Into<Option<WorkItem<T>>>,
    ) -> ResultHandle<T>
    where
        T: Send + 'static,
    {
        self.dispatch_with_handle(PoolKind::Bulk, item.into())
    }

    /// Queue on the critical pool.
    ///
    /// A critical item arriving after `disable()` has stopped the pool is
    /// refused and reported to the error sink with `Severity::Error`.
    pub fn submit_critical(&self, item: impl Into<Option<WorkItem>>) {
        if let Some(item) = item.into() {
            self.dispatch(PoolKind::Critical, item, None);
        }
    }

    pub fn submit_critical_with_handle<T>(
        &self,
        item: impl Into<Option<WorkItem<T>>>,
    ) -> ResultHandle<T>
    where
        T: Send + 'static,
    {
        self.dispatch_with_handle(PoolKind::Critical, item.into())
    }

    /// Replace every stopped pool with a fresh one. Running pools are kept.
    pub fn enable(&self) -> Result<()> {
        for kind in [PoolKind::Bulk, PoolKind::Critical] {
            let mut slot = self.slot(kind).write();
            if slot.is_shutdown() {
                let pool = WorkerPool::new(
                    kind,
                    &self.config,
                    self.reporter.clone(),
                    self.stats_for(kind).clone(),
                )?;
                *slot = Arc::new(pool);
                tracing::debug!(pool = %kind, "pool re-enabled");
            }
        }

        self.interrupter.clear();
        Ok(())
    }

    /// Shut both pools down.
    ///
    /// Queued bulk work is dropped. Queued critical work is pulled back and
    /// run on the calling thread, in submission order, before the bounded
    /// wait for in-flight tasks. Returns
    /// [`Error::Interrupted`](crate::Error::Interrupted) if the wait is
    /// interrupted; both pools are stopped either way.
    pub fn disable(&self) -> Result<ShutdownReport> {
        let started = Instant::now();
        let bulk = self.pool(PoolKind::Bulk);
        let critical = self.pool(PoolKind::Critical);

        tracing::debug!("disabling processing");

        let discarded_bulk = bulk.shutdown();
        let pending = critical.shutdown_now();
        let drained_critical = pending.len();
        let drain_failures = self.run_drained(&critical, pending);

        self.reporter.info(&format!(
            "Processed {} critical task(s) synchronously during shutdown",
            drained_critical
        ));

        let (bulk_forced, critical_forced) = self.ensure_shutdown(&bulk, &critical)?;

        self.reporter.info("Processing shutdown complete");

        Ok(ShutdownReport {
            drained_critical,
            drain_failures,
            discarded_bulk,
            bulk_forced,
            critical_forced,
            elapsed: started.elapsed(),
        })
    }

    /// Both pools are accepting work.
    pub fn is_running(&self) -> bool {
        !self.pool(PoolKind::Bulk).is_shutdown() && !self.pool(PoolKind::Critical).is_shutdown()
    }

    pub fn pool_state(&self, kind: PoolKind) -> PoolState {
        self.pool(kind).state()
    }

    /// Counters accumulated across every pool instance since construction.
    pub fn stats(&self) -> ExecutorStats {
        ExecutorStats {
            bulk: self.bulk_stats.snapshot(),
            critical: self.critical_stats.snapshot(),
        }
    }

    /// Signal that aborts a blocked `disable()` from another thread.
    pub fn interrupter(&self) -> Interrupter {
        self.interrupter.clone()
    }

    fn slot(&self, kind: PoolKind) -> &RwLock<Arc<WorkerPool>> {
        match kind {
            PoolKind::Bulk => &self.bulk,
            PoolKind::Critical => &self.critical,
        }
    }

    fn pool(&self, kind: PoolKind) -> Arc<WorkerPool> {
        self.slot(kind).read().clone()
    }

    fn stats_for(&self, kind: PoolKind) -> &Arc<PoolStats> {
        match kind {
            PoolKind::Bulk => &self.bulk_stats,
            PoolKind::Critical => &self.critical_stats,
        }
    }

    fn dispatch_with_handle<T>(&self, kind: PoolKind, item: Option<WorkItem<T>>) -> ResultHandle<T>
    where
        T: Send + 'static,
    {
        let Some(item) = item else {
            return ResultHandle::rejected();
        };

        let (tx, handle) = ResultHandle::channel();
        if self.dispatch(kind, item, Some(tx)) {
            handle
        } else {
            ResultHandle::rejected()
        }
    }

    fn dispatch<T>(&self, kind: PoolKind, item: WorkItem<T>, tx: Option<Sender<Result<T>>>) -> bool
    where
        T: Send + 'static,
    {
        let pool = self.pool(kind);
        match pool.try_execute(Job::new(kind, item, tx)) {
            Ok(()) => true,
            Err(job) => {
                if kind == PoolKind::Critical {
                    tracing::debug!(task = ?job.id, "critical pool stopped, refusing task");
                    pool.reporter().report(&ErrorRecord {
                        severity: kind.severity(),
                        source: pool.source(),
                        cause: &TaskError::Rejected { pool: kind },
                    });
                }
                false
            }
        }
    }

    fn run_drained(&self, critical: &WorkerPool, pending: Vec<Job>) -> usize {
        if pending.is_empty() {
            return 0;
        }

        let stats = critical.stats_handle();
        stats.record_drained(pending.len());
        let ctx = RunContext {
            kind: PoolKind::Critical,
            source: DRAIN_SOURCE,
            reporter: &self.reporter,
            stats,
        };

        pending.into_iter().fold(0, |failures, job| {
            if job.run(&ctx) {
                failures
            } else {
                failures + 1
            }
        })
    }

    fn ensure_shutdown(&self, bulk: &WorkerPool, critical: &WorkerPool) -> Result<(bool, bool)> {
        let deadline = Instant::now() + self.config.shutdown_timeout;
        let poll = self.config.interrupt_poll_interval;

        let waited = bulk
            .await_termination(deadline, &self.interrupter, poll)
            .and_then(|bulk_done| {
                critical
                    .await_termination(deadline, &self.interrupter, poll)
                    .map(|critical_done| (bulk_done, critical_done))
            });

        match waited {
            Ok((bulk_done, critical_done)) => {
                if !bulk_done {
                    tracing::warn!(
                        timeout_ms = self.config.shutdown_timeout.as_millis() as u64,
                        "bulk pool did not terminate in time, forcing"
                    );
                    bulk.force_terminate();
                }
                critical.force_terminate();
                Ok((!bulk_done, !critical_done))
            }
            Err(err) => {
                tracing::error!("processing shutdown wait interrupted");
                bulk.force_terminate();
                critical.force_terminate();
                Err(err)
            }
        }
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("bulk", &*self.bulk.read())
            .field("critical", &*self.critical.read())
            .field("config", &self.config)
            .finish()
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        let bulk_open = !self.bulk.get_mut().is_shutdown();
        let critical_open = !self.critical.get_mut().is_shutdown();
        if bulk_open || critical_open {
            if let Err(e) = self.disable() {
                tracing::warn!(error = %e, "shutdown on drop failed");
            }
        }
    }
}
