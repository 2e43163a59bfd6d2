//! # Sequential delivery.
//!
//! ```text
//! snapshot: [s1, s2, s3]   (registration order)
//!     s1.notify ──► done ──► s2.notify ──► done ──► s3.notify ──► done
//!        │                      │
//!        └─ failure routed      └─ failure deferred (no error hook)
//! ```
//!
//! ## Rules
//! - Subscriber N+1 starts only after subscriber N's notify future completed
//! - A failure never stops the loop; unhandled ones are returned after the last subscriber

use std::time::Duration;

use crate::dispatch::runner::deliver_once;
use crate::error::SubscriberFailure;
use crate::events::Event;
use crate::subscriptions::Subscription;

pub(crate) async fn deliver_sequential<A: Send + Sync + 'static>(
    event: &Event<A>,
    snapshot: &[Subscription<A>],
    slow: Option<Duration>,
) -> Vec<SubscriberFailure> {
    let mut failures = Vec::new();
    for sub in snapshot {
        if let Some(failure) = deliver_once(sub, event, slow).await {
            failures.push(failure);
        }
    }
    failures
}

#[cfg(test)]
mod tests {
    use crate::{Event, EventingConfig, SubscriptionRequest};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_sequential_calls_never_overlap_and_keep_order() {
        let ev: Event<()> = Event::with_config("seq", EventingConfig::sequential());
        let busy = Arc::new(AtomicBool::new(false));
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut subs = Vec::new();
        for i in 0..5usize {
            let busy = busy.clone();
            let order = order.clone();
            let sub = ev
                .subscribe(SubscriptionRequest::new(move |_ev| {
                    let busy = busy.clone();
                    let order = order.clone();
                    async move {
                        assert!(!busy.swap(true, Ordering::SeqCst), "overlapping notify");
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        order.lock().unwrap().push(i);
                        busy.store(false, Ordering::SeqCst);
                        Ok(())
                    }
                }))
                .await
                .unwrap();
            subs.push(sub);
        }

        ev.fire().await.unwrap();
        ev.fire().await.unwrap();

        assert_eq!(
            *order.lock().unwrap(),
            vec![0, 1, 2, 3, 4, 0, 1, 2, 3, 4]
        );
        ev.delete().await.unwrap();
    }
}
