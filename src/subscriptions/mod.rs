//! # Subscriptions: requests, live registrations and trait-based subscribers.
//!
//! ## Architecture
//! ```text
//! SubscriptionRequest ──► Event::subscribe() ──► Subscription (stored in the event)
//!   notify                                         ├─ handle_subscribe (once)
//!   on-subscribe?                                  ├─ handle_notify    (per raise)
//!   on-unsubscribe?                                ├─ try_handle_error (per failure)
//!   on-error?                                      └─ dispose          (once)
//!
//! Subscriber (trait) ──► SubscriptionRequest::from_subscriber(Arc<S>)
//! ```
//!
//! ## Contents
//! - [`SubscriptionRequest`] immutable bundle of hooks
//! - [`Subscription`] / [`SubscriptionId`] live handle and its identity
//! - [`Subscriber`] trait alternative to closures
//! - [`BoxHookFuture`] boxed future returned by async hooks
//! - `LogWriter` tracing subscriber (feature `logging`)

mod hooks;
#[cfg(feature = "logging")]
mod log;
mod request;
mod subscriber;
mod subscription;

pub use hooks::BoxHookFuture;
#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use request::SubscriptionRequest;
pub use subscriber::Subscriber;
pub use subscription::{Subscription, SubscriptionId};
