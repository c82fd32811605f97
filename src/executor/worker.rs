// worker thread stuff
use super::pool::PoolShared;
use super::task::{Job, RunContext};
use crate::util::Backoff;
use crossbeam_deque::Steal;
use std::sync::Arc;
use std::time::Instant;

pub(crate) type WorkerId = usize;

pub(crate) struct Worker {
    pub(crate) id: WorkerId,
}

impl Worker {
    pub(crate) fn new(id: WorkerId) -> Self {
        Self { id }
    }

    // main loop: runs until the pool leaves the running state
    pub(crate) fn run(&self, shared: Arc<PoolShared>) {
        let ctx = RunContext {
            kind: shared.kind,
            source: &shared.source,
            reporter: &shared.reporter,
            stats: &shared.stats,
        };
        let mut backoff = Backoff::default();

        tracing::trace!(pool = %shared.kind, worker = self.id, "worker started");

        while shared.is_running() {
            match shared.injector.steal() {
                Steal::Success(job) => {
                    backoff.reset();
                    self.execute_task(job, &ctx);
                }
                Steal::Empty => backoff.snooze(),
                Steal::Retry => continue,
            }
        }

        tracing::trace!(pool = %shared.kind, worker = self.id, "worker exiting");
        shared.worker_exited();
    }

    fn execute_task(&self, job: Job, ctx: &RunContext<'_>) {
        let tid = job.id;
        let queued_for = job.enqueue_time.elapsed();
        let start = Instant::now();

        let ok = job.run(ctx);

        tracing::trace!(
            pool = %ctx.kind,
            worker = self.id,
            task = ?tid,
            ok,
            queued_us = queued_for.as_micros() as u64,
            run_us = start.elapsed().as_micros() as u64,
            "task finished"
        );
    }
}
