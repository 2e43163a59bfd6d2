//! # Example: Counter Threshold
//!
//! A counter raises two events once it reaches its threshold: a signal-only one
//! and one carrying the threshold details. Each handler takes a while, so the
//! signal event is delivered sequentially and the detailed one in parallel.
//!
//! Run with: `cargo run --example counter_threshold`

use std::time::{Duration, SystemTime};

use eventvisor::{Event, EventPriority, EventingConfig, SubscriptionRequest};

#[derive(Debug, Clone)]
struct ThresholdReached {
    threshold: u32,
    current: u32,
    reached_at: SystemTime,
}

struct Counter {
    count: u32,
    threshold: u32,
    reached_at: Option<SystemTime>,
    reached: Event<()>,
    reached_with_args: Event<ThresholdReached>,
}

impl Counter {
    fn new(threshold: u32) -> Self {
        Self {
            count: 0,
            threshold,
            reached_at: None,
            reached: Event::with_config("threshold-reached", EventingConfig::sequential()),
            reached_with_args: Event::builder("threshold-reached-args")
                .with_max_parallelism(4)
                .with_priority(EventPriority::High)
                .build(),
        }
    }

    async fn increment(&mut self) -> anyhow::Result<()> {
        self.count += 1;
        if self.count < self.threshold {
            return Ok(());
        }
        let reached_at = *self.reached_at.get_or_insert_with(SystemTime::now);

        println!("raising threshold event");
        self.reached.fire().await?;

        println!("raising threshold event with args");
        self.reached_with_args
            .raise(ThresholdReached {
                threshold: self.threshold,
                current: self.count,
                reached_at,
            })
            .await?;
        Ok(())
    }
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> anyhow::Result<()> {
    let mut counter = Counter::new(10);

    let plain = counter
        .reached
        .subscribe_fn(|ev: Event<()>| async move {
            println!("\t metadata: {:?}", ev.metadata().await);
            println!();
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        })
        .await?;

    let detailed = counter
        .reached_with_args
        .subscribe(
            SubscriptionRequest::new(|ev: Event<ThresholdReached>| async move {
                println!("\t metadata: {:?}", ev.metadata().await);
                if let Some(args) = ev.args().await {
                    println!("\t args:");
                    println!("\t\t threshold: {}", args.threshold);
                    println!("\t\t current count: {}", args.current);
                    println!("\t\t reached at: {:?}", args.reached_at);
                }
                println!();
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(())
            })
            .with_name("threshold-printer")
            .with_error_hook(|err| eprintln!("printer failed: {err:#}")),
        )
        .await?;

    for _ in 0..12 {
        counter.increment().await?;
    }

    counter.reached.unsubscribe(&plain).await?;
    counter.reached_with_args.unsubscribe(&detailed).await?;
    counter.reached.delete().await?;
    counter.reached_with_args.delete().await?;
    Ok(())
}
