//! # Parallel delivery with a bounded number of in-flight notify calls.
//!
//! ```text
//! Semaphore(K)
//!   for sub in snapshot:
//!       permit = acquire_owned()        (waits while K calls are in flight)
//!       spawn { deliver_once(sub); drop(permit) }
//!   for handle in handles:
//!       await handle                    (raise completes after the last call)
//! ```
//!
//! ## Rules
//! - At most `K` notify futures run at any instant
//! - Start order follows the snapshot; completion order is unspecified
//! - A task that panics outside the isolation layer (`JoinError`) is reported as a failure

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::error;

use crate::dispatch::runner::{deliver_once, panic_message};
use crate::error::SubscriberFailure;
use crate::events::Event;
use crate::subscriptions::{Subscription, SubscriptionId};

pub(crate) async fn deliver_parallel<A: Send + Sync + 'static>(
    event: &Event<A>,
    snapshot: Vec<Subscription<A>>,
    max_in_flight: usize,
    slow: Option<Duration>,
) -> Vec<SubscriberFailure> {
    let semaphore = Arc::new(Semaphore::new(max_in_flight.max(1)));
    let mut handles: Vec<(SubscriptionId, JoinHandle<Option<SubscriberFailure>>)> =
        Vec::with_capacity(snapshot.len());

    for sub in snapshot {
        let permit = match Arc::clone(&semaphore).acquire_owned().await {
            Ok(p) => p,
            // the semaphore is local and never closed
            Err(_) => break,
        };
        let event = event.clone();
        let id = sub.id();
        let handle = tokio::spawn(async move {
            let _permit = permit;
            deliver_once(&sub, &event, slow).await
        });
        handles.push((id, handle));
    }

    let mut failures = Vec::new();
    for (id, handle) in handles {
        match handle.await {
            Ok(Some(failure)) => failures.push(failure),
            Ok(None) => {}
            Err(join_err) => {
                let info = if join_err.is_panic() {
                    panic_message(join_err.into_panic().as_ref())
                } else {
                    "delivery task cancelled".to_string()
                };
                error!(subscription = %id, info = %info, "delivery task failed");
                failures.push(SubscriberFailure::new(
                    id,
                    anyhow::anyhow!("delivery task failed: {info}"),
                ));
            }
        }
    }
    failures
}
