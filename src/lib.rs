//! # eventvisor
//!
//! **Eventvisor** is an in-process publish/subscribe library for async Rust.
//!
//! An [`Event<A>`] is a typed channel: subscribers register async callbacks, a
//! raise delivers the args to every live subscriber either one at a time or
//! concurrently with a bounded number of calls in flight, and failures are routed
//! to per-subscriber error hooks or reported back to the raiser after the whole
//! pass.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ┌────────────────────┐  ┌────────────────────┐  ┌────────────────────┐
//!  │ SubscriptionRequest│  │ SubscriptionRequest│  │  Arc<impl          │
//!  │ (closures)         │  │ (closures)         │  │   Subscriber<A>>   │
//!  └─────────┬──────────┘  └─────────┬──────────┘  └─────────┬──────────┘
//!            ▼                       ▼                       ▼
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │  Event<A>                                                             │
//! │  - subscriptions (ordered by registration, duplicate-free)            │
//! │  - EventMetadata (uuid v7 id, created_at, last_fired, priority,       │
//! │                   last caller)                                        │
//! │  - latest args (Arc<A>)                                               │
//! │  - EventingConfig (sync mode, max parallelism, single subscriber)     │
//! └───────────────┬───────────────────────────────────────────────────────┘
//!                 │ raise(args) → snapshot under lock → lock released
//!                 ▼
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │  dispatch (DispatchPolicy captured per pass)                          │
//! │   Sequential: s1 → s2 → s3                                            │
//! │   Parallel:   Semaphore(K) → tokio::spawn per subscription            │
//! └───────┬──────────────────────┬──────────────────────┬─────────────────┘
//!         ▼                      ▼                      ▼
//!   Subscription #1        Subscription #2        Subscription #3
//!   notify(event)          notify(event)          notify(event)
//!     ├─ Ok                  ├─ Err → on_error      ├─ panic, no on_error
//!     │                      │   (handled)          │   → EventError::Unhandled
//!     ▼                      ▼                      ▼
//! ```
//!
//! ### Subscription lifecycle
//! ```text
//! subscribe(request)
//!   ├─► admitted (pending) ──► on_subscribe ──┬─ Ok  ─► live (notified on raise)
//!   │                                         └─ Err ─► rolled back, revoked
//!   │
//! unsubscribe(&sub) / delete() / sub.dispose()
//!   └─► on_unsubscribe (exactly once) ──► token cancelled ──► pruned
//! ```
//!
//! ## Features
//! | Area              | Description                                                        | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------------|---------------------------------------------|
//! | **Events**        | Typed channels, raise with args, metadata.                         | [`Event`], [`EventBuilder`], [`EventMetadata`] |
//! | **Subscriptions** | Closure or trait based subscribers with lifecycle hooks.           | [`SubscriptionRequest`], [`Subscriber`], [`Subscription`] |
//! | **Policies**      | Sequential or bounded-parallel delivery.                           | [`SyncMode`], [`DispatchPolicy`]            |
//! | **Errors**        | Typed errors with aggregated subscriber failures.                  | [`EventError`], [`SubscriberFailure`]       |
//! | **Configuration** | Per-event settings, no global state.                               | [`EventingConfig`]                          |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use eventvisor::{Event, EventingConfig, SubscriptionRequest};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ev: Event<u32> = Event::with_config("temperature", EventingConfig::sequential());
//!     let highest = Arc::new(AtomicU32::new(0));
//!
//!     let seen = Arc::clone(&highest);
//!     let sub = ev
//!         .subscribe(
//!             SubscriptionRequest::new(move |ev: Event<u32>| {
//!                 let seen = Arc::clone(&seen);
//!                 async move {
//!                     if let Some(t) = ev.args().await {
//!                         seen.fetch_max(*t, Ordering::SeqCst);
//!                     }
//!                     Ok(())
//!                 }
//!             })
//!             .with_name("max-tracker")
//!             .with_error_hook(|err| eprintln!("tracker failed: {err:#}")),
//!         )
//!         .await?;
//!
//!     ev.raise(18).await?;
//!     ev.raise(23).await?;
//!     assert_eq!(highest.load(Ordering::SeqCst), 23);
//!
//!     ev.unsubscribe(&sub).await?;
//!     ev.delete().await?;
//!     Ok(())
//! }
//! ```
mod config;
mod dispatch;
mod error;
mod events;
mod policies;
mod subscriptions;

// ---- Public re-exports ----

pub use config::EventingConfig;
pub use error::{EventError, HookError, SubscriberFailure};
pub use events::{Caller, Event, EventBuilder, EventMetadata, EventPriority};
pub use policies::{DispatchPolicy, FALLBACK_PARALLELISM, SyncMode, default_parallelism};
pub use subscriptions::{BoxHookFuture, Subscriber, Subscription, SubscriptionId, SubscriptionRequest};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscriptions::LogWriter;
