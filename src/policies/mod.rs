//! Delivery policies.
//!
//! This module groups the knobs that control **how** subscribers of one event are
//! notified when it is raised.
//!
//! ## Contents
//! - [`SyncMode`] configured delivery mode (sequential / parallel)
//! - [`DispatchPolicy`] resolved strategy captured at the start of each pass
//!
//! ## Quick wiring
//! ```text
//! EventingConfig { sync_mode, max_parallelism, .. }
//!      └─► EventingConfig::dispatch_policy() ─► DispatchPolicy
//!           └─► Event::notify_subscribers() snapshots it, then:
//!                - Sequential → dispatch::sequential
//!                - Parallel   → dispatch::parallel (semaphore-bounded)
//! ```
//!
//! ## Defaults
//! - `SyncMode::Parallel`, `max_parallelism = 0` → hardware concurrency (fallback 10).

mod dispatch;

pub use dispatch::{DispatchPolicy, FALLBACK_PARALLELISM, SyncMode, default_parallelism};
