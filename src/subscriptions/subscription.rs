//! # Subscription: a live, disposable registration.
//!
//! A [`Subscription`] is created by [`Event::subscribe`](crate::Event::subscribe) from a
//! [`SubscriptionRequest`] and mediates every hook invocation for its lifetime.
//!
//! ## Lifecycle
//! ```text
//! subscribe(request)
//!     └─► Subscription (active, token live)
//!            ├─► handle_subscribe  (once, after admission)
//!            ├─► handle_notify     (per raise; skipped once cancelled)
//!            └─► dispose()
//!                  ├─ disposed.swap(true) == true → no-op (idempotent)
//!                  ├─ on-unsubscribe hook (exactly once)
//!                  └─ token.cancel()      → future deliveries skipped
//! ```
//!
//! ## Rules
//! - Identity is handle identity: clones share one registration, two subscriptions
//!   built from the same request are never equal.
//! - Cancellation is **advisory** for a notify call already running and
//!   **authoritative** for new ones.
//! - Dropping the last handle of an undisposed subscription cancels its token and
//!   logs a warning; the on-unsubscribe hook is **not** run. Dispose explicitly.

use std::borrow::Cow;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use futures::FutureExt;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::dispatch::panic_message;
use crate::error::{EventError, HookError};
use crate::events::Event;
use crate::subscriptions::hooks::{ErrorHook, NotifyHook, SubscribeHook, UnsubscribeHook};
use crate::subscriptions::request::SubscriptionRequest;

/// Global sequence counter for subscription ids.
static SUBSCRIPTION_SEQ: AtomicU64 = AtomicU64::new(1);

/// Process-unique subscription identifier; increases with creation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    fn next() -> Self {
        Self(SUBSCRIPTION_SEQ.fetch_add(1, Ordering::Relaxed))
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

struct Inner<A> {
    id: SubscriptionId,
    name: Cow<'static, str>,
    notify: NotifyHook<A>,
    on_subscribe: Option<SubscribeHook<A>>,
    on_unsubscribe: Option<UnsubscribeHook>,
    on_error: Option<ErrorHook>,
    token: CancellationToken,
    disposed: AtomicBool,
    /// Id of the event this subscription was admitted into.
    owner: OnceLock<Uuid>,
}

/// Handle to a live registration of one subscriber.
///
/// Cheap to clone; every clone refers to the same registration.
pub struct Subscription<A> {
    inner: Arc<Inner<A>>,
}

impl<A: Send + Sync + 'static> Subscription<A> {
    pub(crate) fn from_request(request: SubscriptionRequest<A>) -> Self {
        let SubscriptionRequest {
            name,
            notify,
            on_subscribe,
            on_unsubscribe,
            on_error,
        } = request;

        Self {
            inner: Arc::new(Inner {
                id: SubscriptionId::next(),
                name,
                notify,
                on_subscribe,
                on_unsubscribe,
                on_error,
                token: CancellationToken::new(),
                disposed: AtomicBool::new(false),
                owner: OnceLock::new(),
            }),
        }
    }

    /// Runs the on-subscribe hook, if any.
    pub(crate) async fn handle_subscribe(&self, event: &Event<A>) -> Result<(), HookError> {
        match &self.inner.on_subscribe {
            Some(hook) => hook(event.clone()).await,
            None => Ok(()),
        }
    }

    /// Runs the notify hook unless cancellation was already requested.
    pub(crate) async fn handle_notify(&self, event: &Event<A>) -> Result<(), HookError> {
        if self.inner.token.is_cancelled() {
            return Ok(());
        }
        (self.inner.notify)(event.clone()).await
    }

    /// Hands `error` to the error hook.
    ///
    /// Returns the error back when no hook is registered.
    pub(crate) fn try_handle_error(&self, error: HookError) -> Result<(), HookError> {
        match &self.inner.on_error {
            Some(hook) => {
                hook(error);
                Ok(())
            }
            None => Err(error),
        }
    }

    /// Disposes the subscription: runs on-unsubscribe once, then cancels the token.
    ///
    /// Idempotent: every call after the first (including concurrent ones) returns
    /// `Ok(())` without running the hook again. The token is cancelled even when the
    /// hook fails.
    ///
    /// Disposing directly (instead of via [`Event::unsubscribe`](crate::Event::unsubscribe))
    /// leaves the entry in the event until its next raise prunes it.
    pub async fn dispose(&self) -> Result<(), EventError> {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let res = match &self.inner.on_unsubscribe {
            Some(hook) => AssertUnwindSafe(hook())
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    Err(anyhow::anyhow!(
                        "on-unsubscribe hook panicked: {}",
                        panic_message(panic.as_ref())
                    ))
                }),
            None => Ok(()),
        };
        self.inner.token.cancel();
        debug!(subscription = %self.inner.id, name = %self.inner.name, "subscription disposed");

        res.map_err(|error| EventError::UnsubscribeHook {
            subscription: self.inner.id,
            error,
        })
    }

    /// Blocking variant of [`Subscription::dispose`].
    ///
    /// Inside a multi-threaded tokio runtime the hook is driven with
    /// `block_in_place`; outside any runtime it runs on a local executor.
    ///
    /// # Errors
    /// [`EventError::BlockingDispose`] when called from a current-thread runtime,
    /// where blocking would stall the only worker. Nothing is disposed; use
    /// [`Subscription::dispose`] there.
    pub fn dispose_blocking(&self) -> Result<(), EventError> {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(self.dispose()))
            }
            Ok(_) => {
                warn!(subscription = %self.inner.id, "dispose_blocking called on a current-thread runtime");
                Err(EventError::BlockingDispose {
                    subscription: self.inner.id,
                })
            }
            Err(_) => futures::executor::block_on(self.dispose()),
        }
    }

    /// Marks the subscription disposed without running on-unsubscribe.
    ///
    /// Used when admission is rolled back.
    pub(crate) fn revoke(&self) {
        self.inner.disposed.store(true, Ordering::Release);
        self.inner.token.cancel();
    }

    /// Binds the subscription to `event_id`.
    ///
    /// Returns `false` when it already belongs to a different event.
    pub(crate) fn bind_owner(&self, event_id: Uuid) -> bool {
        *self.inner.owner.get_or_init(|| event_id) == event_id
    }
}

impl<A> Subscription<A> {
    /// Process-unique id of this registration.
    pub fn id(&self) -> SubscriptionId {
        self.inner.id
    }

    /// Name given by the request (for logs).
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Token cancelled when the subscription is disposed.
    ///
    /// Long-running notify hooks can watch it to stop early.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.token.clone()
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    #[inline]
    pub fn has_error_hook(&self) -> bool {
        self.inner.on_error.is_some()
    }
}

impl<A> Clone for Subscription<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> PartialEq for Subscription<A> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<A> Eq for Subscription<A> {}

impl<A> fmt::Debug for Subscription<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl<A> Drop for Inner<A> {
    fn drop(&mut self) {
        if !*self.disposed.get_mut() {
            self.token.cancel();
            warn!(
                subscription = %self.id,
                name = %self.name,
                "subscription dropped without dispose; on-unsubscribe hook skipped"
            );
        }
    }
}
