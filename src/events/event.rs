//! # Event: a typed channel of subscribers.
//!
//! An [`Event<A>`] owns its subscriptions (ordered by registration), one
//! [`EventMetadata`], its [`EventingConfig`] and the args of the latest raise.
//! Handles are cheap to clone and share one state.
//!
//! ## States
//! ```text
//! Live ──delete()──► Deleted (terminal)
//!   subscribe / unsubscribe / raise     subscribe, raise → EventError::Deleted
//!                                       delete           → Ok(()) (idempotent)
//! ```
//!
//! ## Raise
//! ```text
//! raise(args)
//!   ├─ write lock: record last_fired + caller, store args
//!   └─ notify_subscribers()
//!        ├─ write lock: prune disposed, snapshot live subscriptions, capture policy
//!        ├─ (lock released)
//!        ├─ dispatch::deliver(policy, snapshot)
//!        └─ unhandled failures? → Err(EventError::Unhandled) after the whole pass
//! ```
//!
//! ## Rules
//! - No lock is held while a hook runs; hooks may call back into the event.
//! - A subscription whose on-subscribe hook is still running is not notified.
//! - Only `raise` / `raise_from` advance the metadata.
//! - Notify hooks that capture a clone of their own event keep it alive; call
//!   [`Event::delete`] to tear such an event down.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::RwLock;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::config::EventingConfig;
use crate::dispatch::{self, panic_message};
use crate::error::{EventError, HookError, SubscriberFailure};
use crate::events::builder::EventBuilder;
use crate::events::metadata::{Caller, EventMetadata, EventPriority};
use crate::subscriptions::{Subscription, SubscriptionId, SubscriptionRequest};

struct EventState<A> {
    subscribers: BTreeMap<SubscriptionId, Subscription<A>>,
    /// Admitted subscriptions whose on-subscribe hook has not finished yet.
    pending: BTreeSet<SubscriptionId>,
    metadata: EventMetadata,
    args: Option<Arc<A>>,
    deleted: bool,
}

impl<A> EventState<A> {
    fn prune_disposed(&mut self) {
        self.subscribers.retain(|_, sub| !sub.is_disposed());
    }

    fn live_count(&self) -> usize {
        self.subscribers
            .values()
            .filter(|sub| !sub.is_disposed())
            .count()
    }
}

struct EventInner<A> {
    id: Uuid,
    name: Cow<'static, str>,
    config: EventingConfig,
    state: RwLock<EventState<A>>,
}

/// Publishable channel with typed args `A` (`()` for signal-only events).
pub struct Event<A = ()> {
    inner: Arc<EventInner<A>>,
}

impl<A: Send + Sync + 'static> Event<A> {
    /// Creates an event with the default [`EventingConfig`].
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self::with_config(name, EventingConfig::default())
    }

    /// Creates an event with an explicit configuration.
    pub fn with_config(name: impl Into<Cow<'static, str>>, config: EventingConfig) -> Self {
        Self::from_parts(name.into(), config, EventPriority::default())
    }

    /// Starts an [`EventBuilder`].
    pub fn builder(name: impl Into<Cow<'static, str>>) -> EventBuilder<A> {
        EventBuilder::new(name)
    }

    pub(crate) fn from_parts(
        name: Cow<'static, str>,
        config: EventingConfig,
        priority: EventPriority,
    ) -> Self {
        let metadata = EventMetadata::new(priority);
        Self {
            inner: Arc::new(EventInner {
                id: metadata.id(),
                name,
                config,
                state: RwLock::new(EventState {
                    subscribers: BTreeMap::new(),
                    pending: BTreeSet::new(),
                    metadata,
                    args: None,
                    deleted: false,
                }),
            }),
        }
    }

    /// Registers a new subscriber built from `request`.
    ///
    /// The on-subscribe hook runs after admission and before the subscription can
    /// be notified. If it fails (or panics) the registration is rolled back and the
    /// on-unsubscribe hook is **not** run.
    ///
    /// # Errors
    /// - [`EventError::Deleted`] the event was deleted
    /// - [`EventError::SubscriberLimit`] single-subscriber event already has one
    /// - [`EventError::SubscribeHook`] the on-subscribe hook failed
    pub async fn subscribe(
        &self,
        request: SubscriptionRequest<A>,
    ) -> Result<Subscription<A>, EventError> {
        let sub = Subscription::from_request(request);
        match self.add_subscription(&sub).await {
            Ok(_) => Ok(sub),
            Err(err) => {
                sub.revoke();
                Err(err)
            }
        }
    }

    /// Shorthand for subscribing with only a notify hook.
    pub async fn subscribe_fn<F, Fut>(&self, notify: F) -> Result<Subscription<A>, EventError>
    where
        F: Fn(Event<A>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        self.subscribe(SubscriptionRequest::new(notify)).await
    }

    /// Adds an existing subscription to this event.
    ///
    /// Returns `Ok(false)` when it is already registered here (no-op).
    ///
    /// # Errors
    /// Same as [`Event::subscribe`], plus [`EventError::SubscriptionDisposed`] and
    /// [`EventError::ForeignSubscription`].
    pub async fn add_subscription(&self, sub: &Subscription<A>) -> Result<bool, EventError> {
        if sub.is_disposed() {
            return Err(EventError::SubscriptionDisposed {
                subscription: sub.id(),
            });
        }
        if !sub.bind_owner(self.inner.id) {
            return Err(EventError::ForeignSubscription {
                subscription: sub.id(),
            });
        }

        {
            let mut state = self.inner.state.write().await;
            if state.deleted {
                return Err(self.deleted_error());
            }
            if state.subscribers.contains_key(&sub.id()) {
                return Ok(false);
            }
            if !self.inner.config.allow_multiple_subscribers && state.live_count() > 0 {
                return Err(EventError::SubscriberLimit {
                    event: self.inner.name.to_string(),
                });
            }
            state.subscribers.insert(sub.id(), sub.clone());
            state.pending.insert(sub.id());
        }

        let hooked = AssertUnwindSafe(sub.handle_subscribe(self))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(anyhow::anyhow!(
                    "on-subscribe hook panicked: {}",
                    panic_message(panic.as_ref())
                ))
            });

        let mut state = self.inner.state.write().await;
        state.pending.remove(&sub.id());
        if let Err(error) = hooked {
            state.subscribers.remove(&sub.id());
            drop(state);
            sub.revoke();
            warn!(event = %self.inner.name, subscription = %sub.id(), "on-subscribe hook failed, registration rolled back");
            return Err(EventError::SubscribeHook {
                subscription: sub.id(),
                error,
            });
        }
        if !state.subscribers.contains_key(&sub.id()) {
            // removed and disposed while the hook was running
            return Err(if state.deleted {
                self.deleted_error()
            } else {
                EventError::SubscriptionDisposed {
                    subscription: sub.id(),
                }
            });
        }
        drop(state);

        debug!(event = %self.inner.name, subscription = %sub.id(), name = %sub.name(), "subscribed");
        Ok(true)
    }

    /// Removes `sub` and disposes it (runs on-unsubscribe once).
    ///
    /// Returns `Ok(false)` when it was not registered with this event. Safe to call
    /// from inside the subscription's own notify hook.
    ///
    /// # Errors
    /// [`EventError::UnsubscribeHook`] when the on-unsubscribe hook failed; the
    /// subscription is removed and cancelled anyway.
    pub async fn unsubscribe(&self, sub: &Subscription<A>) -> Result<bool, EventError> {
        let removed = {
            let mut state = self.inner.state.write().await;
            state.pending.remove(&sub.id());
            state.subscribers.remove(&sub.id())
        };
        let Some(removed) = removed else {
            return Ok(false);
        };

        removed.dispose().await?;
        debug!(event = %self.inner.name, subscription = %removed.id(), "unsubscribed");
        Ok(true)
    }

    /// Disposes every subscription and moves the event to the deleted state.
    ///
    /// Keeps disposing after a failing on-unsubscribe hook. Calling it again is a
    /// no-op.
    ///
    /// # Errors
    /// [`EventError::Teardown`] listing every on-unsubscribe failure.
    pub async fn delete(&self) -> Result<(), EventError> {
        let drained: Vec<Subscription<A>> = {
            let mut state = self.inner.state.write().await;
            if state.deleted {
                return Ok(());
            }
            state.deleted = true;
            state.pending.clear();
            state.args = None;
            std::mem::take(&mut state.subscribers).into_values().collect()
        };

        let mut failures = Vec::new();
        for sub in &drained {
            match sub.dispose().await {
                Ok(()) => {}
                Err(EventError::UnsubscribeHook {
                    subscription,
                    error,
                }) => failures.push(SubscriberFailure::new(subscription, error)),
                Err(other) => failures.push(SubscriberFailure::new(sub.id(), other.into())),
            }
        }

        debug!(
            event = %self.inner.name,
            disposed = drained.len(),
            failed = failures.len(),
            "event deleted"
        );
        if failures.is_empty() {
            Ok(())
        } else {
            Err(EventError::Teardown { failures })
        }
    }

    /// Raises the event with `args`.
    ///
    /// Returns after every subscriber of the pass was notified.
    ///
    /// # Errors
    /// - [`EventError::Deleted`] the event was deleted
    /// - [`EventError::Unhandled`] subscribers without an error hook failed
    pub async fn raise(&self, args: A) -> Result<(), EventError> {
        self.raise_with(args, None).await
    }

    /// Raises the event with `args`, recording `caller` in the metadata.
    pub async fn raise_from(&self, args: A, caller: Caller) -> Result<(), EventError> {
        self.raise_with(args, Some(caller)).await
    }

    async fn raise_with(&self, args: A, caller: Option<Caller>) -> Result<(), EventError> {
        {
            let mut state = self.inner.state.write().await;
            if state.deleted {
                return Err(self.deleted_error());
            }
            state.metadata.record_raise(caller);
            state.args = Some(Arc::new(args));
        }
        self.notify_subscribers().await
    }

    /// Notifies every live subscriber with the current args.
    ///
    /// The dispatch policy is resolved once, before the pass starts. Does not
    /// advance the metadata.
    ///
    /// # Errors
    /// Same as [`Event::raise`].
    pub async fn notify_subscribers(&self) -> Result<(), EventError> {
        let policy = self.inner.config.dispatch_policy();
        let slow = self.inner.config.slow_threshold();

        let snapshot: Vec<Subscription<A>> = {
            let mut state = self.inner.state.write().await;
            if state.deleted {
                return Err(self.deleted_error());
            }
            state.prune_disposed();
            let EventState {
                subscribers,
                pending,
                ..
            } = &*state;
            subscribers
                .iter()
                .filter(|(id, _)| !pending.contains(*id))
                .map(|(_, sub)| sub.clone())
                .collect()
        };

        if snapshot.is_empty() {
            trace!(event = %self.inner.name, "raised without subscribers");
            return Ok(());
        }
        debug!(
            event = %self.inner.name,
            subscribers = snapshot.len(),
            max_in_flight = policy.max_in_flight(),
            "notifying subscribers"
        );

        let failures = dispatch::deliver(policy, self, snapshot, slow).await;
        if failures.is_empty() {
            return Ok(());
        }

        for failure in &failures {
            warn!(event = %self.inner.name, subscription = %failure.subscription, error = %format!("{:#}", failure.error), "unhandled subscriber failure");
        }
        Err(EventError::Unhandled { failures })
    }

    fn deleted_error(&self) -> EventError {
        EventError::Deleted {
            event: self.inner.name.to_string(),
        }
    }
}

impl<A> Event<A> {
    /// Name of the event kind.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Configuration the event was built with.
    pub fn config(&self) -> &EventingConfig {
        &self.inner.config
    }

    /// Snapshot of the event's metadata.
    pub async fn metadata(&self) -> EventMetadata {
        self.inner.state.read().await.metadata.clone()
    }

    /// Args of the latest raise (`None` before the first one or after deletion).
    pub async fn args(&self) -> Option<Arc<A>> {
        self.inner.state.read().await.args.clone()
    }

    /// Number of registered, non-disposed subscriptions.
    pub async fn subscriber_count(&self) -> usize {
        self.inner.state.read().await.live_count()
    }

    /// Whether [`Event::delete`] has run.
    pub async fn is_deleted(&self) -> bool {
        self.inner.state.read().await.deleted
    }

    /// Whether `sub` is currently registered with this event.
    pub async fn contains(&self, sub: &Subscription<A>) -> bool {
        self.inner
            .state
            .read()
            .await
            .subscribers
            .contains_key(&sub.id())
    }
}

impl Event<()> {
    /// Raises a signal-only event.
    pub async fn fire(&self) -> Result<(), EventError> {
        self.raise(()).await
    }
}

impl<A> Clone for Event<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> fmt::Debug for Event<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.inner.name)
            .field("id", &self.inner.id)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl<A> Drop for EventInner<A> {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if state.deleted {
            return;
        }
        for sub in state.subscribers.values() {
            sub.cancellation_token().cancel();
        }
        if !state.subscribers.is_empty() {
            debug!(
                event = %self.name,
                subscribers = state.subscribers.len(),
                "event dropped without delete; subscriptions cancelled"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SyncMode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    fn counter_request<A: Send + Sync + 'static>(
        notified: Arc<AtomicUsize>,
    ) -> SubscriptionRequest<A> {
        SubscriptionRequest::new(move |_ev| {
            let notified = notified.clone();
            async move {
                notified.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    #[tokio::test]
    async fn test_subscribe_then_unsubscribe_runs_each_hook_once() {
        let ev: Event<()> = Event::new("lifecycle");
        let subscribed = Arc::new(AtomicUsize::new(0));
        let unsubscribed = Arc::new(AtomicUsize::new(0));

        let (s, u) = (subscribed.clone(), unsubscribed.clone());
        let sub = ev
            .subscribe(
                SubscriptionRequest::new(|_ev| async { Ok(()) })
                    .with_subscribe_hook(move |_ev| {
                        let s = s.clone();
                        async move {
                            s.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        }
                    })
                    .with_unsubscribe_hook(move || {
                        let u = u.clone();
                        async move {
                            u.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        }
                    }),
            )
            .await
            .unwrap();

        assert_eq!(ev.subscriber_count().await, 1);
        assert!(ev.contains(&sub).await);

        assert!(ev.unsubscribe(&sub).await.unwrap());
        assert!(!ev.unsubscribe(&sub).await.unwrap());

        assert_eq!(ev.subscriber_count().await, 0);
        assert_eq!(subscribed.load(Ordering::SeqCst), 1);
        assert_eq!(unsubscribed.load(Ordering::SeqCst), 1);
        assert!(sub.is_disposed());
    }

    #[tokio::test]
    async fn test_abc_scenario_handled_failure_raise_succeeds() {
        let ev: Event<String> = Event::with_config("greet", EventingConfig::sequential());
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let b_errors = Arc::new(Mutex::new(Vec::<String>::new()));

        let recorder = |tag: &'static str| {
            let seen = seen.clone();
            SubscriptionRequest::new(move |ev: Event<String>| {
                let seen = seen.clone();
                async move {
                    if let Some(args) = ev.args().await {
                        seen.lock().unwrap().push(format!("{tag}:{args}"));
                    }
                    Ok(())
                }
            })
        };

        ev.subscribe(recorder("A")).await.unwrap();
        let sink = b_errors.clone();
        ev.subscribe(
            SubscriptionRequest::new(|_ev| async { Err(anyhow::anyhow!("B failed")) })
                .with_error_hook(move |err| sink.lock().unwrap().push(err.to_string())),
        )
        .await
        .unwrap();
        ev.subscribe(recorder("C")).await.unwrap();

        assert!(ev.raise("payload".to_string()).await.is_ok());
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["A:payload".to_string(), "C:payload".to_string()]
        );
        assert_eq!(*b_errors.lock().unwrap(), vec!["B failed".to_string()]);
        ev.delete().await.unwrap();
    }

    #[tokio::test]
    async fn test_unhandled_failure_fails_raise_after_all_subscribers() {
        let ev: Event<String> = Event::with_config("greet", EventingConfig::sequential());
        let a_seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let c_errors = Arc::new(Mutex::new(Vec::<String>::new()));

        let seen = a_seen.clone();
        let _a = ev
            .subscribe(SubscriptionRequest::new(move |ev: Event<String>| {
                let seen = seen.clone();
                async move {
                    if let Some(args) = ev.args().await {
                        seen.lock().unwrap().push(args.as_ref().clone());
                    }
                    Ok(())
                }
            }))
            .await
            .unwrap();

        let b = ev
            .subscribe_fn(|_ev| async { Err(anyhow::anyhow!("B is broken")) })
            .await
            .unwrap();

        let sink = c_errors.clone();
        let _c = ev
            .subscribe(
                SubscriptionRequest::new(|_ev| async { Err(anyhow::anyhow!("C is broken")) })
                    .with_error_hook(move |err| sink.lock().unwrap().push(err.to_string())),
            )
            .await
            .unwrap();

        let err = ev.raise("hello".to_string()).await.unwrap_err();
        match &err {
            EventError::Unhandled { failures } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].subscription, b.id());
                assert_eq!(failures[0].error.to_string(), "B is broken");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(*a_seen.lock().unwrap(), vec!["hello".to_string()]);
        assert_eq!(*c_errors.lock().unwrap(), vec!["C is broken".to_string()]);
        ev.delete().await.unwrap();
    }

    #[tokio::test]
    async fn test_handled_failure_does_not_fail_raise() {
        let ev: Event<u8> = Event::new("handled");
        let handled = Arc::new(AtomicUsize::new(0));
        let notified = Arc::new(AtomicUsize::new(0));

        let h = handled.clone();
        ev.subscribe(
            SubscriptionRequest::new(|_ev| async { Err(anyhow::anyhow!("nope")) })
                .with_error_hook(move |_err| {
                    h.fetch_add(1, Ordering::SeqCst);
                }),
        )
        .await
        .unwrap();
        ev.subscribe(counter_request(notified.clone())).await.unwrap();

        ev.raise(1).await.unwrap();
        ev.raise(2).await.unwrap();

        assert_eq!(handled.load(Ordering::SeqCst), 2);
        assert_eq!(notified.load(Ordering::SeqCst), 2);
        ev.delete().await.unwrap();
    }

    #[tokio::test]
    async fn test_raise_without_subscribers_advances_metadata() {
        let ev: Event<u32> = Event::new("lonely");
        let before = ev.metadata().await;
        assert!(before.last_fired().is_none());

        ev.raise_from(5, Arc::new(42u64)).await.unwrap();

        let after = ev.metadata().await;
        assert_eq!(after.id(), before.id());
        assert_eq!(after.created_at(), before.created_at());
        assert!(after.last_fired().is_some());
        assert_eq!(after.last_caller_as::<u64>().as_deref(), Some(&42));
        assert_eq!(ev.args().await.as_deref(), Some(&5));

        ev.raise(6).await.unwrap();
        assert!(ev.metadata().await.last_caller().is_none());
    }

    #[tokio::test]
    async fn test_notify_subscribers_does_not_advance_metadata() {
        let ev: Event<()> = Event::new("renotify");
        let notified = Arc::new(AtomicUsize::new(0));
        ev.subscribe(counter_request(notified.clone())).await.unwrap();

        ev.notify_subscribers().await.unwrap();
        assert!(ev.metadata().await.last_fired().is_none());
        assert_eq!(notified.load(Ordering::SeqCst), 1);
        ev.delete().await.unwrap();
    }

    async fn self_unsubscribe_scenario(config: EventingConfig) {
        let ev: Event<()> = Event::with_config("self-unsub", config);
        let notified = Arc::new(AtomicUsize::new(0));
        let own: Arc<OnceLock<Subscription<()>>> = Arc::new(OnceLock::new());

        for i in 0..5 {
            if i == 2 {
                let own_in_hook = own.clone();
                let n = notified.clone();
                let sub = ev
                    .subscribe(SubscriptionRequest::new(move |ev: Event<()>| {
                        let own = own_in_hook.clone();
                        let n = n.clone();
                        async move {
                            n.fetch_add(1, Ordering::SeqCst);
                            if let Some(me) = own.get() {
                                ev.unsubscribe(me).await?;
                            }
                            Ok(())
                        }
                    }))
                    .await
                    .unwrap();
                own.set(sub).unwrap();
            } else {
                ev.subscribe(counter_request(notified.clone())).await.unwrap();
            }
        }

        ev.fire().await.unwrap();
        assert_eq!(notified.load(Ordering::SeqCst), 5);
        assert_eq!(ev.subscriber_count().await, 4);

        ev.fire().await.unwrap();
        assert_eq!(notified.load(Ordering::SeqCst), 9);
        ev.delete().await.unwrap();
    }

    #[tokio::test]
    async fn test_self_unsubscribe_sequential() {
        self_unsubscribe_scenario(EventingConfig::sequential()).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_self_unsubscribe_parallel() {
        self_unsubscribe_scenario(EventingConfig::parallel(3)).await;
    }

    #[tokio::test]
    async fn test_deleted_event_rejects_subscribe_and_raise() {
        let ev: Event<()> = Event::new("gone");
        let unsubscribed = Arc::new(AtomicUsize::new(0));
        let u = unsubscribed.clone();
        let sub = ev
            .subscribe(SubscriptionRequest::new(|_ev| async { Ok(()) }).with_unsubscribe_hook(
                move || {
                    let u = u.clone();
                    async move {
                        u.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                },
            ))
            .await
            .unwrap();

        ev.delete().await.unwrap();
        ev.delete().await.unwrap();

        assert!(ev.is_deleted().await);
        assert!(sub.is_disposed());
        assert_eq!(unsubscribed.load(Ordering::SeqCst), 1);
        assert_eq!(ev.subscriber_count().await, 0);

        let err = ev.fire().await.unwrap_err();
        assert_eq!(err.as_label(), "event_deleted");
        let err = ev.subscribe_fn(|_ev| async { Ok(()) }).await.unwrap_err();
        assert_eq!(err.as_label(), "event_deleted");
    }

    #[tokio::test]
    async fn test_single_subscriber_limit() {
        let cfg = EventingConfig {
            allow_multiple_subscribers: false,
            ..EventingConfig::default()
        };
        let ev: Event<()> = Event::with_config("solo", cfg);

        let first = ev.subscribe_fn(|_ev| async { Ok(()) }).await.unwrap();
        let err = ev.subscribe_fn(|_ev| async { Ok(()) }).await.unwrap_err();
        assert!(matches!(err, EventError::SubscriberLimit { .. }));

        ev.unsubscribe(&first).await.unwrap();
        ev.subscribe_fn(|_ev| async { Ok(()) }).await.unwrap();
        assert_eq!(ev.subscriber_count().await, 1);
        ev.delete().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_subscribe_hook_rolls_back() {
        let ev: Event<()> = Event::new("rollback");
        let unsubscribed = Arc::new(AtomicUsize::new(0));
        let u = unsubscribed.clone();

        let err = ev
            .subscribe(
                SubscriptionRequest::new(|_ev| async { Ok(()) })
                    .with_subscribe_hook(|_ev| async { Err(anyhow::anyhow!("no socket")) })
                    .with_unsubscribe_hook(move || {
                        let u = u.clone();
                        async move {
                            u.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        }
                    }),
            )
            .await
            .unwrap_err();

        match err {
            EventError::SubscribeHook { error, .. } => assert_eq!(error.to_string(), "no socket"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(ev.subscriber_count().await, 0);
        assert_eq!(unsubscribed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_add_subscription_rules() {
        let ev: Event<()> = Event::new("first");
        let other: Event<()> = Event::new("second");
        let sub = ev.subscribe_fn(|_ev| async { Ok(()) }).await.unwrap();

        assert!(!ev.add_subscription(&sub).await.unwrap());
        assert_eq!(ev.subscriber_count().await, 1);

        let err = other.add_subscription(&sub).await.unwrap_err();
        assert!(matches!(err, EventError::ForeignSubscription { .. }));

        ev.unsubscribe(&sub).await.unwrap();
        let err = ev.add_subscription(&sub).await.unwrap_err();
        assert!(matches!(err, EventError::SubscriptionDisposed { .. }));
    }

    #[tokio::test]
    async fn test_delete_aggregates_teardown_failures() {
        let ev: Event<()> = Event::new("teardown");
        let clean = Arc::new(AtomicUsize::new(0));

        let bad = ev
            .subscribe(
                SubscriptionRequest::new(|_ev| async { Ok(()) })
                    .with_unsubscribe_hook(|| async { Err(anyhow::anyhow!("flush failed")) }),
            )
            .await
            .unwrap();
        let c = clean.clone();
        let good = ev
            .subscribe(SubscriptionRequest::new(|_ev| async { Ok(()) }).with_unsubscribe_hook(
                move || {
                    let c = c.clone();
                    async move {
                        c.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                },
            ))
            .await
            .unwrap();

        let err = ev.delete().await.unwrap_err();
        assert_eq!(err.as_label(), "teardown_failed");
        assert_eq!(err.failures().len(), 1);
        assert_eq!(err.failures()[0].subscription, bad.id());

        assert_eq!(clean.load(Ordering::SeqCst), 1);
        assert!(bad.is_disposed());
        assert!(good.is_disposed());
    }

    #[tokio::test]
    async fn test_directly_disposed_subscription_is_pruned() {
        let ev: Event<()> = Event::new("prune");
        let notified = Arc::new(AtomicUsize::new(0));
        let sub = ev.subscribe(counter_request(notified.clone())).await.unwrap();

        sub.dispose().await.unwrap();
        assert_eq!(ev.subscriber_count().await, 0);
        assert!(ev.contains(&sub).await);

        ev.fire().await.unwrap();
        assert_eq!(notified.load(Ordering::SeqCst), 0);
        assert!(!ev.contains(&sub).await);
    }

    #[tokio::test]
    async fn test_dropping_event_cancels_subscriptions() {
        let ev: Event<()> = Event::new("dropped");
        let sub = ev.subscribe_fn(|_ev| async { Ok(()) }).await.unwrap();
        let token = sub.cancellation_token();

        drop(ev);
        assert!(token.is_cancelled());
        sub.dispose().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_subscriber_still_delivered_in_order() {
        let cfg = EventingConfig {
            sync_mode: SyncMode::Sequential,
            slow_subscriber_threshold: Duration::from_millis(10),
            ..EventingConfig::default()
        };
        let ev: Event<()> = Event::with_config("slow", cfg);
        let order = Arc::new(Mutex::new(Vec::new()));

        for (i, delay) in [(0usize, 50u64), (1, 0)] {
            let order = order.clone();
            ev.subscribe_fn(move |_ev| {
                let order = order.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    order.lock().unwrap().push(i);
                    Ok(())
                }
            })
            .await
            .unwrap();
        }

        ev.fire().await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec![0, 1]);
        ev.delete().await.unwrap();
    }

    #[tokio::test]
    async fn test_reentrant_raise_from_notify_hook() {
        let source: Event<u32> = Event::with_config("source", EventingConfig::sequential());
        let sink: Event<u32> = Event::new("sink");
        let total = Arc::new(AtomicUsize::new(0));

        let t = total.clone();
        sink.subscribe_fn(move |ev: Event<u32>| {
            let t = t.clone();
            async move {
                let v = ev.args().await.map(|a| *a).unwrap_or_default();
                t.fetch_add(v as usize, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap();

        let forward = sink.clone();
        source
            .subscribe_fn(move |ev: Event<u32>| {
                let forward = forward.clone();
                async move {
                    let v = ev.args().await.map(|a| *a).unwrap_or_default();
                    forward.raise(v * 2).await?;
                    Ok(())
                }
            })
            .await
            .unwrap();

        source.raise(21).await.unwrap();
        assert_eq!(total.load(Ordering::SeqCst), 42);
        source.delete().await.unwrap();
        sink.delete().await.unwrap();
    }
}
