//! # Trait-based subscribers
//!
//! [`Subscriber`] is the extension point for plugging a stateful type into an
//! [`Event`] instead of wiring individual closures. Convert it into a request with
//! [`SubscriptionRequest::from_subscriber`](crate::SubscriptionRequest::from_subscriber).
//!
//! ## Contract
//! - [`Subscriber::on_notify`] runs on every raise while the subscription is active.
//! - [`Subscriber::on_subscribe`] / [`Subscriber::on_unsubscribe`] run exactly once.
//! - Failures of `on_notify` reach [`Subscriber::on_error`] only when
//!   [`Subscriber::handles_errors`] returns `true`; otherwise they fail the raise.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use async_trait::async_trait;
//! use eventvisor::{Event, HookError, Subscriber, SubscriptionRequest};
//!
//! #[derive(Default)]
//! struct Totals(AtomicU64);
//!
//! #[async_trait]
//! impl Subscriber<u64> for Totals {
//!     async fn on_notify(&self, event: &Event<u64>) -> Result<(), HookError> {
//!         if let Some(amount) = event.args().await {
//!             self.0.fetch_add(*amount, Ordering::Relaxed);
//!         }
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &'static str { "totals" }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), eventvisor::EventError> {
//! let totals = Arc::new(Totals::default());
//! let ev: Event<u64> = Event::new("payment");
//! let sub = ev.subscribe(SubscriptionRequest::from_subscriber(totals.clone())).await?;
//!
//! ev.raise(40).await?;
//! ev.raise(2).await?;
//! assert_eq!(totals.0.load(Ordering::Relaxed), 42);
//!
//! ev.unsubscribe(&sub).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::error::HookError;
use crate::events::Event;

/// Contract for trait-based subscribers of an `Event<A>`.
#[async_trait]
pub trait Subscriber<A>: Send + Sync + 'static
where
    A: Send + Sync + 'static,
{
    /// Handles one raise of `event`.
    async fn on_notify(&self, event: &Event<A>) -> Result<(), HookError>;

    /// Called once right after the subscription is admitted.
    async fn on_subscribe(&self, _event: &Event<A>) -> Result<(), HookError> {
        Ok(())
    }

    /// Called once when the subscription is disposed.
    async fn on_unsubscribe(&self) -> Result<(), HookError> {
        Ok(())
    }

    /// Whether [`Subscriber::on_error`] should receive notify failures.
    fn handles_errors(&self) -> bool {
        false
    }

    /// Receives a failure of [`Subscriber::on_notify`] when
    /// [`Subscriber::handles_errors`] is `true`.
    fn on_error(&self, _error: HookError) {}

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
