//! # Example: Parallel Fan-out
//!
//! Eight slow subscribers on one event, at most three notified at a time.
//! `LogWriter` traces every notification; one subscriber fails without an error
//! hook to show how unhandled failures come back from `raise`.
//!
//! Run with: `cargo run --example parallel_fanout --features logging`

use std::sync::Arc;
use std::time::{Duration, Instant};

use eventvisor::{Event, EventError, LogWriter, SubscriptionRequest};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let ev: Event<String> = Event::builder("jobs")
        .with_max_parallelism(3)
        .with_slow_subscriber_threshold(Duration::from_millis(250))
        .build();

    ev.subscribe(SubscriptionRequest::from_subscriber(Arc::new(LogWriter::new())))
        .await?;

    for worker in 0..8u64 {
        ev.subscribe(
            SubscriptionRequest::new(move |ev: Event<String>| async move {
                tokio::time::sleep(Duration::from_millis(100 + worker * 30)).await;
                if worker == 5 {
                    anyhow::bail!("worker {worker} could not process {:?}", ev.args().await);
                }
                Ok(())
            })
            .with_name(format!("worker-{worker}")),
        )
        .await?;
    }

    let started = Instant::now();
    match ev.raise("nightly-build".to_string()).await {
        Ok(()) => println!("all subscribers succeeded"),
        Err(EventError::Unhandled { failures }) => {
            for failure in &failures {
                println!("unhandled: {failure}");
            }
        }
        Err(other) => return Err(other.into()),
    }
    println!(
        "raise took {:?} for {} subscribers",
        started.elapsed(),
        ev.subscriber_count().await
    );

    ev.delete().await?;
    Ok(())
}
