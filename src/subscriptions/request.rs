//! # Subscription request: the hooks one subscriber wants to register.
//!
//! [`SubscriptionRequest`] bundles a **required** notify hook and three optional ones:
//!
//! | hook             | signature                               | when                                  |
//! |------------------|-----------------------------------------|---------------------------------------|
//! | notify           | `Fn(Event<A>) -> Future<Result>`        | every raise while active              |
//! | on-subscribe     | `Fn(Event<A>) -> Future<Result>`        | once, right after admission           |
//! | on-unsubscribe   | `Fn() -> Future<Result>`                | once, on disposal                     |
//! | on-error         | `Fn(HookError)` (synchronous)           | when notify fails or panics           |
//!
//! The notify hook is taken by value in [`SubscriptionRequest::new`], so a request
//! without one cannot be built. Hooks are shared (`Arc`) into the
//! [`Subscription`](crate::Subscription) at registration; the request itself can be
//! cloned and reused for other events.
//!
//! ## Example
//! ```rust
//! use eventvisor::{Event, SubscriptionRequest};
//!
//! let request = SubscriptionRequest::<u32>::new(|ev: Event<u32>| async move {
//!     let _latest = ev.args().await;
//!     Ok(())
//! })
//! .with_name("audit")
//! .with_error_hook(|err| eprintln!("audit failed: {err:#}"));
//!
//! assert!(request.has_error_hook());
//! assert_eq!(request.name(), "audit");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::error::HookError;
use crate::events::Event;
use crate::subscriptions::hooks::{
    BoxHookFuture, ErrorHook, NotifyHook, SubscribeHook, UnsubscribeHook,
};
use crate::subscriptions::subscriber::Subscriber;

/// Immutable description of one subscriber's hooks.
pub struct SubscriptionRequest<A> {
    pub(crate) name: Cow<'static, str>,
    pub(crate) notify: NotifyHook<A>,
    pub(crate) on_subscribe: Option<SubscribeHook<A>>,
    pub(crate) on_unsubscribe: Option<UnsubscribeHook>,
    pub(crate) on_error: Option<ErrorHook>,
}

impl<A: Send + Sync + 'static> SubscriptionRequest<A> {
    /// Creates a request with the required notify hook.
    pub fn new<F, Fut>(notify: F) -> Self
    where
        F: Fn(Event<A>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        Self {
            name: Cow::Borrowed("anonymous"),
            notify: Arc::new(move |ev: Event<A>| -> BoxHookFuture { Box::pin(notify(ev)) }),
            on_subscribe: None,
            on_unsubscribe: None,
            on_error: None,
        }
    }

    /// Builds a request whose hooks forward to a [`Subscriber`] implementation.
    ///
    /// The error hook is registered only when [`Subscriber::handles_errors`] is `true`.
    pub fn from_subscriber<S: Subscriber<A>>(subscriber: Arc<S>) -> Self {
        let name = subscriber.name();

        let s = Arc::clone(&subscriber);
        let mut request = Self::new(move |ev: Event<A>| {
            let s = Arc::clone(&s);
            async move { s.on_notify(&ev).await }
        })
        .with_name(name);

        let s = Arc::clone(&subscriber);
        request = request.with_subscribe_hook(move |ev: Event<A>| {
            let s = Arc::clone(&s);
            async move { s.on_subscribe(&ev).await }
        });

        let s = Arc::clone(&subscriber);
        request = request.with_unsubscribe_hook(move || {
            let s = Arc::clone(&s);
            async move { s.on_unsubscribe().await }
        });

        if subscriber.handles_errors() {
            request = request.with_error_hook(move |err| subscriber.on_error(err));
        }
        request
    }

    /// Sets a human-readable name (for logs).
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the hook run once after the subscription is admitted.
    pub fn with_subscribe_hook<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Event<A>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        self.on_subscribe = Some(Arc::new(move |ev: Event<A>| -> BoxHookFuture {
            Box::pin(hook(ev))
        }));
        self
    }

    /// Sets the hook run once when the subscription is disposed.
    pub fn with_unsubscribe_hook<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        self.on_unsubscribe = Some(Arc::new(move || -> BoxHookFuture { Box::pin(hook()) }));
        self
    }

    /// Sets the hook receiving failures (errors or panics) of the notify hook.
    ///
    /// A failure passed here is considered handled and is not reported to the raiser.
    pub fn with_error_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(HookError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }
}

impl<A> SubscriptionRequest<A> {
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn has_subscribe_hook(&self) -> bool {
        self.on_subscribe.is_some()
    }

    #[inline]
    pub fn has_unsubscribe_hook(&self) -> bool {
        self.on_unsubscribe.is_some()
    }

    #[inline]
    pub fn has_error_hook(&self) -> bool {
        self.on_error.is_some()
    }
}

impl<A> Clone for SubscriptionRequest<A> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            notify: Arc::clone(&self.notify),
            on_subscribe: self.on_subscribe.clone(),
            on_unsubscribe: self.on_unsubscribe.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<A> fmt::Debug for SubscriptionRequest<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRequest")
            .field("name", &self.name)
            .field("on_subscribe", &self.has_subscribe_hook())
            .field("on_unsubscribe", &self.has_unsubscribe_hook())
            .field("on_error", &self.has_error_hook())
            .finish()
    }
}
