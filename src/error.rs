//! Error types used by the eventing engine.
//!
//! - [`EventError`] errors returned by [`Event`](crate::Event) and
//!   [`Subscription`](crate::Subscription) operations.
//! - [`SubscriberFailure`] one subscriber's failure tagged with its subscription id.
//! - [`HookError`] the failure value produced by subscriber hooks.
//!
//! [`EventError`] provides helper methods (`as_label`, `as_message`) for logs/metrics,
//! and [`EventError::failures`] for inspecting aggregated subscriber failures.

use std::fmt;

use thiserror::Error;

use crate::subscriptions::SubscriptionId;

/// Failure value returned (or raised as a panic) by a subscriber hook.
///
/// Hooks return `Result<(), HookError>`; any `std::error::Error + Send + Sync + 'static`
/// converts into it with `?`.
pub type HookError = anyhow::Error;

/// A single subscriber failure, tagged with the subscription that produced it.
#[derive(Debug)]
pub struct SubscriberFailure {
    /// Subscription whose hook failed.
    pub subscription: SubscriptionId,
    /// The failure returned by the hook.
    pub error: HookError,
}

impl SubscriberFailure {
    pub(crate) fn new(subscription: SubscriptionId, error: HookError) -> Self {
        Self {
            subscription,
            error,
        }
    }
}

impl fmt::Display for SubscriberFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:#}", self.subscription, self.error)
    }
}

/// # Errors produced by event operations.
///
/// Subscriber failures that were consumed by an error hook never show up here;
/// only failures nobody handled are surfaced to the caller.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum EventError {
    /// The event was deleted; it no longer accepts subscriptions or raises.
    #[error("event {event:?} is deleted")]
    Deleted {
        /// Name of the deleted event.
        event: String,
    },

    /// The event is configured for a single subscriber and already has one.
    #[error("event {event:?} does not allow multiple subscribers")]
    SubscriberLimit {
        /// Name of the event.
        event: String,
    },

    /// The subscription was already disposed and cannot be registered again.
    #[error("{subscription} is disposed")]
    SubscriptionDisposed {
        /// The disposed subscription.
        subscription: SubscriptionId,
    },

    /// The subscription is registered with a different event.
    #[error("{subscription} belongs to another event")]
    ForeignSubscription {
        /// The foreign subscription.
        subscription: SubscriptionId,
    },

    /// The on-subscribe hook failed; the registration was rolled back.
    #[error("on-subscribe hook of {subscription} failed: {error:#}")]
    SubscribeHook {
        /// Subscription that failed to set up.
        subscription: SubscriptionId,
        /// The hook failure.
        error: HookError,
    },

    /// The on-unsubscribe hook failed during disposal.
    #[error("on-unsubscribe hook of {subscription} failed: {error:#}")]
    UnsubscribeHook {
        /// Subscription being disposed.
        subscription: SubscriptionId,
        /// The hook failure.
        error: HookError,
    },

    /// Blocking disposal was requested from a current-thread tokio runtime.
    #[error("{subscription} cannot be disposed blocking on a current-thread runtime")]
    BlockingDispose {
        /// Subscription left untouched.
        subscription: SubscriptionId,
    },

    /// One or more subscribers without an error hook failed during a raise.
    ///
    /// Reported only after every subscriber of the pass was attempted.
    #[error(
        "{} subscriber(s) failed without an error hook; first: {}",
        .failures.len(),
        first_failure(.failures)
    )]
    Unhandled {
        /// Every unhandled failure of the pass.
        failures: Vec<SubscriberFailure>,
    },

    /// One or more on-unsubscribe hooks failed while deleting an event.
    #[error(
        "{} subscription(s) failed to tear down; first: {}",
        .failures.len(),
        first_failure(.failures)
    )]
    Teardown {
        /// Every teardown failure.
        failures: Vec<SubscriberFailure>,
    },
}

fn first_failure(failures: &[SubscriberFailure]) -> String {
    failures
        .first()
        .map(ToString::to_string)
        .unwrap_or_else(|| "none".to_string())
}

impl EventError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use eventvisor::EventError;
    ///
    /// let err = EventError::Deleted { event: "orders".into() };
    /// assert_eq!(err.as_label(), "event_deleted");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            EventError::Deleted { .. } => "event_deleted",
            EventError::SubscriberLimit { .. } => "event_subscriber_limit",
            EventError::SubscriptionDisposed { .. } => "subscription_disposed",
            EventError::ForeignSubscription { .. } => "subscription_foreign",
            EventError::SubscribeHook { .. } => "subscribe_hook_failed",
            EventError::UnsubscribeHook { .. } => "unsubscribe_hook_failed",
            EventError::BlockingDispose { .. } => "blocking_dispose_unsupported",
            EventError::Unhandled { .. } => "unhandled_subscriber_failure",
            EventError::Teardown { .. } => "teardown_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            EventError::Deleted { event } => format!("deleted: {event}"),
            EventError::SubscriberLimit { event } => format!("single subscriber: {event}"),
            EventError::SubscriptionDisposed { subscription } => {
                format!("disposed: {subscription}")
            }
            EventError::ForeignSubscription { subscription } => {
                format!("foreign: {subscription}")
            }
            EventError::SubscribeHook {
                subscription,
                error,
            } => format!("subscribe: {subscription}: {error:#}"),
            EventError::UnsubscribeHook {
                subscription,
                error,
            } => format!("unsubscribe: {subscription}: {error:#}"),
            EventError::BlockingDispose { subscription } => {
                format!("blocking dispose: {subscription}")
            }
            EventError::Unhandled { failures } => {
                format!("unhandled: {}", join_failures(failures))
            }
            EventError::Teardown { failures } => {
                format!("teardown: {}", join_failures(failures))
            }
        }
    }

    /// Returns the aggregated subscriber failures carried by this error.
    ///
    /// Empty for variants that do not aggregate failures.
    pub fn failures(&self) -> &[SubscriberFailure] {
        match self {
            EventError::Unhandled { failures } | EventError::Teardown { failures } => failures,
            _ => &[],
        }
    }
}

fn join_failures(failures: &[SubscriberFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unhandled_display_reports_count_and_first() {
        let err = EventError::Unhandled {
            failures: vec![
                SubscriberFailure::new(SubscriptionId::from_raw(7), anyhow::anyhow!("boom")),
                SubscriberFailure::new(SubscriptionId::from_raw(9), anyhow::anyhow!("bang")),
            ],
        };
        assert_eq!(
            err.to_string(),
            "2 subscriber(s) failed without an error hook; first: sub-7: boom"
        );
        assert_eq!(err.as_label(), "unhandled_subscriber_failure");
        assert_eq!(err.failures().len(), 2);
        assert_eq!(err.as_message(), "unhandled: sub-7: boom; sub-9: bang");
    }

    #[test]
    fn test_non_aggregate_variants_have_no_failures() {
        let err = EventError::SubscriberLimit {
            event: "single".into(),
        };
        assert!(err.failures().is_empty());
        assert_eq!(
            err.to_string(),
            "event \"single\" does not allow multiple subscribers"
        );
    }
}
