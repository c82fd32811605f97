use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tandem_rs::prelude::*;

#[derive(Default)]
struct Recorder {
    errors: Mutex<Vec<(Severity, String, String)>>,
    lines: Mutex<Vec<String>>,
}

impl ErrorSink for Recorder {
    fn report(&self, record: &ErrorRecord<'_>) {
        self.errors.lock().push((
            record.severity,
            record.source.to_string(),
            record.cause.to_string(),
        ));
    }
}

impl StatusLog for Recorder {
    fn info(&self, message: &str) {
        self.lines.lock().push(message.to_string());
    }
}

fn executor(sink: &Arc<Recorder>, bulk: usize, critical: usize, timeout: Duration) -> Executor {
    let config = Config::builder()
        .bulk_workers(bulk)
        .critical_workers(critical)
        .shutdown_timeout(timeout)
        .build()
        .unwrap();
    Executor::new(config, Reporter::shared(sink.clone())).unwrap()
}

/// Occupy a pool's only worker until `hold` has elapsed.
fn occupy(executor: &Executor, importance: Importance, hold: Duration) -> Arc<AtomicBool> {
    let done = Arc::new(AtomicBool::new(false));
    let (started_tx, started_rx) = crossbeam_channel::bounded(1);

    let flag = done.clone();
    executor.submit(WorkItem::new(importance, move || {
        let _ = started_tx.send(());
        thread::sleep(hold);
        flag.store(true, Ordering::SeqCst);
        Ok(())
    }));
    started_rx.recv().unwrap();
    done
}

#[test]
fn test_queued_critical_items_run_on_disabling_thread_in_order() {
    let sink = Arc::new(Recorder::default());
    let executor = executor(&sink, 2, 1, Duration::from_secs(2));

    let first_done = occupy(&executor, Importance::Critical, Duration::from_millis(200));

    let ran = Arc::new(Mutex::new(Vec::new()));
    for name in ["second", "third"] {
        let ran = ran.clone();
        executor.submit(WorkItem::critical_fn(move || {
            ran.lock().push((name, thread::current().id()));
        }));
    }

    let report = executor.disable().unwrap();

    let me = thread::current().id();
    assert_eq!(*ran.lock(), vec![("second", me), ("third", me)]);
    assert_eq!(report.drained_critical, 2);
    assert_eq!(report.drain_failures, 0);
    assert!(first_done.load(Ordering::SeqCst));
    assert!(!report.critical_forced);
    assert_eq!(
        sink.lines.lock()[0],
        "Processed 2 critical task(s) synchronously during shutdown"
    );
    assert_eq!(executor.stats().critical.drained, 2);
}

#[test]
fn test_drained_handles_resolve_with_values() {
    let sink = Arc::new(Recorder::default());
    let executor = executor(&sink, 1, 1, Duration::from_secs(2));

    occupy(&executor, Importance::Critical, Duration::from_millis(150));
    let handle = executor.submit_critical_with_handle(WorkItem::critical_fn(|| 40 + 2));

    executor.disable().unwrap();
    assert_eq!(handle.join().unwrap(), 42);
}

#[test]
fn test_non_critical_after_disable_is_a_no_op() {
    let sink = Arc::new(Recorder::default());
    let executor = executor(&sink, 2, 1, Duration::from_secs(1));
    executor.disable().unwrap();

    let counter = Arc::new(AtomicUsize::new(0));
    for _ in 0..10 {
        let counter = counter.clone();
        executor.submit_non_critical(WorkItem::non_critical_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
    }
    let handle = executor.submit_with_handle(WorkItem::non_critical_fn(|| 1));

    thread::sleep(Duration::from_millis(50));
    assert_eq!(counter.load(Ordering::SeqCst), 0);
    assert!(matches!(handle.join(), Err(Error::Rejected)));
    assert!(sink.errors.lock().is_empty());
    assert_eq!(executor.stats().bulk.rejected, 11);
}

#[test]
fn test_failures_are_isolated_on_workers() {
    let sink = Arc::new(Recorder::default());
    let executor = executor(&sink, 1, 1, Duration::from_secs(1));

    let handles: Vec<ResultHandle<u32>> = (0..4u32)
        .map(|i| {
            executor.submit_with_handle(WorkItem::non_critical(move || {
                if i % 2 == 0 {
                    Err(TaskError::failed(format!("item {} failed", i)))
                } else {
                    Ok(i)
                }
            }))
        })
        .collect();

    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().ok()).collect();
    assert_eq!(outcomes, vec![None, Some(1), None, Some(3)]);

    let errors = sink.errors.lock();
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .all(|(severity, source, _)| *severity == Severity::Warning && source == "bulk-pool"));
    assert_eq!(errors[0].2, "item 0 failed");
}

#[test]
fn test_failing_drained_item_is_reported_once() {
    let sink = Arc::new(Recorder::default());
    let executor = executor(&sink, 1, 1, Duration::from_secs(2));

    occupy(&executor, Importance::Critical, Duration::from_millis(150));

    let after = Arc::new(AtomicBool::new(false));
    executor.submit_critical(WorkItem::<()>::critical(|| Err(TaskError::failed("always fails"))));
    let flag = after.clone();
    executor.submit_critical(WorkItem::critical_fn(move || flag.store(true, Ordering::SeqCst)));

    let report = executor.disable().unwrap();

    assert_eq!(report.drained_critical, 2);
    assert_eq!(report.drain_failures, 1);
    assert!(after.load(Ordering::SeqCst));
    assert_eq!(
        *sink.errors.lock(),
        vec![(
            Severity::Error,
            "shutdown-drain".to_string(),
            "always fails".to_string()
        )]
    );
}

#[test]
fn test_panicking_drained_item_does_not_stop_the_drain() {
    let sink = Arc::new(Recorder::default());
    let executor = executor(&sink, 1, 1, Duration::from_secs(2));

    occupy(&executor, Importance::Critical, Duration::from_millis(150));

    let counter = Arc::new(AtomicUsize::new(0));
    executor.submit_critical(WorkItem::<()>::critical_fn(|| panic!("drain boom")));
    for _ in 0..3 {
        let counter = counter.clone();
        executor.submit_critical(WorkItem::critical_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
    }

    let report = executor.disable().unwrap();
    assert_eq!(report.drained_critical, 4);
    assert_eq!(counter.load(Ordering::SeqCst), 3);
    assert_eq!(sink.errors.lock().len(), 1);
}

#[test]
fn test_sleeping_bulk_items_abandoned_without_errors() {
    let sink = Arc::new(Recorder::default());
    let executor = executor(&sink, 2, 1, Duration::from_secs(1));

    let counter = Arc::new(AtomicUsize::new(0));
    for _ in 0..5 {
        let counter = counter.clone();
        executor.submit(WorkItem::non_critical_fn(move || {
            thread::sleep(Duration::from_millis(50));
            counter.fetch_add(1, Ordering::SeqCst);
        }));
    }

    let start = Instant::now();
    let report = executor.disable().unwrap();

    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(!report.bulk_forced);
    let ran = counter.load(Ordering::SeqCst);
    assert!(ran <= 5);
    assert_eq!(ran + report.discarded_bulk, 5);
    assert!(sink.errors.lock().is_empty());
}

#[test]
fn test_slow_bulk_work_is_forced_down() {
    let sink = Arc::new(Recorder::default());
    let executor = executor(&sink, 1, 1, Duration::from_millis(100));

    let done = occupy(&executor, Importance::NonCritical, Duration::from_millis(1500));

    let start = Instant::now();
    let report = executor.disable().unwrap();

    assert!(start.elapsed() < Duration::from_millis(1000));
    assert!(report.bulk_forced);
    assert!(!done.load(Ordering::SeqCst));
    assert_eq!(executor.pool_state(PoolKind::Bulk), PoolState::Stopped);
    assert_eq!(sink.lines.lock().last().unwrap(), "Processing shutdown complete");
}

#[test]
fn test_interrupted_wait_stops_both_pools() {
    let sink = Arc::new(Recorder::default());
    let executor = executor(&sink, 1, 1, Duration::from_secs(5));

    occupy(&executor, Importance::NonCritical, Duration::from_millis(1500));

    let interrupter = executor.interrupter();
    let trigger = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        interrupter.interrupt();
    });

    let start = Instant::now();
    let result = executor.disable();
    trigger.join().unwrap();

    assert!(matches!(result, Err(Error::Interrupted)));
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(executor.pool_state(PoolKind::Bulk), PoolState::Stopped);
    assert_eq!(executor.pool_state(PoolKind::Critical), PoolState::Stopped);
    // the completion line is only written when shutdown finishes normally
    assert_eq!(sink.lines.lock().len(), 1);

    executor.enable().unwrap();
    let handle = executor.submit_with_handle(WorkItem::critical_fn(|| "back"));
    assert_eq!(handle.join().unwrap(), "back");
}

#[test]
fn test_enable_restores_both_pools() {
    let sink = Arc::new(Recorder::default());
    let executor = executor(&sink, 2, 1, Duration::from_secs(1));

    executor.disable().unwrap();
    assert!(!executor.is_running());

    executor.enable().unwrap();
    executor.enable().unwrap();
    assert!(executor.is_running());

    let bulk = executor.submit_with_handle(WorkItem::non_critical_fn(|| 1));
    let critical = executor.submit_with_handle(WorkItem::critical_fn(|| 2));
    assert_eq!(bulk.join().unwrap() + critical.join().unwrap(), 3);
}

#[test]
fn test_queued_bulk_handles_are_abandoned() {
    let sink = Arc::new(Recorder::default());
    let executor = executor(&sink, 1, 1, Duration::from_secs(2));

    occupy(&executor, Importance::NonCritical, Duration::from_millis(150));
    let handle = executor.submit_non_critical_with_handle(WorkItem::non_critical_fn(|| 5));

    let report = executor.disable().unwrap();
    assert_eq!(report.discarded_bulk, 1);
    assert!(matches!(handle.join(), Err(Error::Abandoned)));
    assert_eq!(executor.stats().bulk.abandoned, 1);
}

#[test]
fn test_shared_between_submitting_threads() {
    let sink = Arc::new(Recorder::default());
    let executor = Arc::new(executor(&sink, 4, 2, Duration::from_secs(1)));

    let submitters: Vec<_> = (0..4)
        .map(|t| {
            let executor = executor.clone();
            thread::spawn(move || {
                (0..100)
                    .map(|i| {
                        let importance = if i % 10 == 0 {
                            Importance::Critical
                        } else {
                            Importance::NonCritical
                        };
                        let item = WorkItem::new(importance, move || Ok(t * 1000 + i));
                        executor.submit_with_handle(item)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut total = 0;
    for submitter in submitters {
        for handle in submitter.join().unwrap() {
            handle.join().unwrap();
            total += 1;
        }
    }

    assert_eq!(total, 400);
    let stats = executor.stats();
    assert_eq!(stats.bulk.completed + stats.critical.completed, 400);
    assert_eq!(stats.critical.completed, 40);
}
