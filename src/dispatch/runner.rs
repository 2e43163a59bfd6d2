//! # Deliver one raise to one subscription.
//!
//! - **Skip** cancelled subscriptions (disposed or disposing)
//! - **Isolate** failures: errors and panics of the notify hook become a [`HookError`]
//! - **Route** the failure to the subscription's error hook, or hand it back as a
//!   [`SubscriberFailure`] for the caller to report after the pass
//! - **Warn** when the notify call exceeds the slow-subscriber threshold
//!
//! ## Outcome
//! ```text
//! cancelled            → None (nothing delivered)
//! Ok(())               → None
//! Err / panic + hook   → error hook(error) → None
//! Err / panic, no hook → Some(SubscriberFailure)
//! error hook panics    → Some(SubscriberFailure) (reported as unhandled)
//! ```

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tracing::{debug, error, trace, warn};

use crate::error::{HookError, SubscriberFailure};
use crate::events::Event;
use crate::subscriptions::Subscription;

/// Delivers the current raise of `event` to `sub`.
///
/// Returns the failure when nobody handled it.
pub(crate) async fn deliver_once<A: Send + Sync + 'static>(
    sub: &Subscription<A>,
    event: &Event<A>,
    slow: Option<Duration>,
) -> Option<SubscriberFailure> {
    if sub.is_cancelled() {
        trace!(subscription = %sub.id(), "skipping cancelled subscription");
        return None;
    }

    let started = Instant::now();
    let res = AssertUnwindSafe(sub.handle_notify(event))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            Err(anyhow::anyhow!(
                "subscriber panicked: {}",
                panic_message(panic.as_ref())
            ))
        });

    if let Some(limit) = slow {
        let elapsed = started.elapsed();
        if elapsed > limit {
            warn!(
                event = %event.name(),
                subscription = %sub.id(),
                name = %sub.name(),
                elapsed_ms = elapsed.as_millis() as u64,
                limit_ms = limit.as_millis() as u64,
                "slow subscriber"
            );
        }
    }

    match res {
        Ok(()) => None,
        Err(err) => route_failure(sub, err),
    }
}

/// Sends `err` to the error hook; returns it as a failure when unhandled.
fn route_failure<A: Send + Sync + 'static>(
    sub: &Subscription<A>,
    err: HookError,
) -> Option<SubscriberFailure> {
    match std::panic::catch_unwind(AssertUnwindSafe(|| sub.try_handle_error(err))) {
        Ok(Ok(())) => {
            debug!(subscription = %sub.id(), "delivery failure handled by error hook");
            None
        }
        Ok(Err(err)) => Some(SubscriberFailure::new(sub.id(), err)),
        Err(panic) => {
            let info = panic_message(panic.as_ref());
            error!(subscription = %sub.id(), info = %info, "error hook panicked");
            Some(SubscriberFailure::new(
                sub.id(),
                anyhow::anyhow!("error hook panicked: {info}"),
            ))
        }
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SubscriptionRequest;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_panic_message_variants() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u8), "unknown panic");
    }

    #[tokio::test]
    async fn test_panicking_notify_reaches_error_hook() {
        let seen = Arc::new(Mutex::new(None::<String>));
        let sink = seen.clone();
        let ev: Event<()> = Event::new("panics");
        let sub = ev
            .subscribe(
                SubscriptionRequest::new(|_ev| async {
                    if true {
                        panic!("kaboom");
                    }
                    Ok(())
                })
                    .with_error_hook(move |err| *sink.lock().unwrap() = Some(err.to_string())),
            )
            .await
            .unwrap();

        assert!(deliver_once(&sub, &ev, None).await.is_none());
        assert_eq!(
            seen.lock().unwrap().as_deref(),
            Some("subscriber panicked: kaboom")
        );
        ev.delete().await.unwrap();
    }

    #[tokio::test]
    async fn test_panicking_error_hook_is_reported() {
        let ev: Event<()> = Event::new("double-fault");
        let sub = ev
            .subscribe(
                SubscriptionRequest::new(|_ev| async { Err(anyhow::anyhow!("first")) })
                    .with_error_hook(|_err| panic!("hook broke")),
            )
            .await
            .unwrap();

        let failure = deliver_once(&sub, &ev, None).await.unwrap();
        assert_eq!(failure.subscription, sub.id());
        assert_eq!(failure.error.to_string(), "error hook panicked: hook broke");
        ev.delete().await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_subscription_is_skipped() {
        let ev: Event<()> = Event::new("skip");
        let sub = ev
            .subscribe(SubscriptionRequest::new(|_ev| async {
                Err(anyhow::anyhow!("must not run"))
            }))
            .await
            .unwrap();

        sub.dispose().await.unwrap();
        assert!(deliver_once(&sub, &ev, None).await.is_none());
    }
}
