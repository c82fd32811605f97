//! Shows what happens to queued work when the executor is disabled.
//!
//! Run with `RUST_LOG=tandem_rs=debug cargo run --example shutdown_drain`.

use std::thread;
use std::time::Duration;
use tandem_rs::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_thread_names(true)
        .init();

    let config = Config::builder()
        .bulk_workers(2)
        .critical_workers(1)
        .shutdown_timeout(Duration::from_millis(500))
        .build()?;
    let executor = Executor::new(config, Reporter::tracing())?;

    // keep the single critical worker busy so the rest of the critical work queues up
    executor.submit(WorkItem::critical_fn(|| {
        thread::sleep(Duration::from_millis(200));
        println!("long critical task finished on {:?}", thread::current().name());
    }));

    for i in 0..3 {
        executor.submit(WorkItem::critical_fn(move || {
            println!("critical #{} ran on {:?}", i, thread::current().name());
        }));
    }
    executor.submit(WorkItem::<()>::critical(|| {
        Err(TaskError::failed("ledger unavailable"))
    }));

    for i in 0..20 {
        executor.submit(WorkItem::non_critical_fn(move || {
            thread::sleep(Duration::from_millis(50));
            println!("bulk #{} done", i);
        }));
    }

    thread::sleep(Duration::from_millis(20));
    let report = executor.disable()?;

    println!("{:#?}", report);
    println!("{:#?}", executor.stats());
    Ok(())
}
