//! # Dispatch policy for notifying subscribers.
//!
//! [`SyncMode`] is the configured delivery mode; [`DispatchPolicy`] is the resolved
//! strategy value an [`Event`](crate::Event) snapshots at the start of every
//! notification pass.
//!
//! - [`DispatchPolicy::Sequential`] one subscriber at a time, in registration order.
//! - [`DispatchPolicy::Parallel`] fan-out with at most `max_parallelism` deliveries in flight.
//!
//! ## Choosing the right mode
//! ```text
//! Subscribers depend on each other's side effects  → SyncMode::Sequential
//! Subscribers are independent, some are slow (I/O) → SyncMode::Parallel
//! ```
//!
//! # Example
//! ```rust
//! use eventvisor::{DispatchPolicy, EventingConfig, SyncMode};
//!
//! let cfg = EventingConfig {
//!     sync_mode: SyncMode::Parallel,
//!     max_parallelism: 4,
//!     ..EventingConfig::default()
//! };
//! assert_eq!(cfg.dispatch_policy(), DispatchPolicy::Parallel { max_parallelism: 4 });
//! assert_eq!(DispatchPolicy::Sequential.max_in_flight(), 1);
//! ```

/// Worker count used for parallel dispatch when hardware concurrency is unknown.
pub const FALLBACK_PARALLELISM: usize = 10;

/// Delivery mode selected by configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// Subscribers are notified one after another.
    Sequential,
    /// Subscribers are notified concurrently, bounded by `max_parallelism` (default).
    #[default]
    Parallel,
}

/// Resolved dispatch strategy for one notification pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Deliver in registration order; subscriber N+1 starts after subscriber N completed.
    Sequential,
    /// Deliver concurrently from one snapshot.
    ///   - `max_parallelism`: maximum number of notify calls in flight (always `>= 1`).
    Parallel { max_parallelism: usize },
}

impl DispatchPolicy {
    /// Builds a parallel policy; `0` resolves to [`default_parallelism`].
    pub fn parallel(max_parallelism: usize) -> Self {
        let max_parallelism = if max_parallelism == 0 {
            default_parallelism()
        } else {
            max_parallelism
        };
        DispatchPolicy::Parallel { max_parallelism }
    }

    /// Maximum number of notify calls this policy lets run at the same time.
    #[inline]
    pub fn max_in_flight(&self) -> usize {
        match self {
            DispatchPolicy::Sequential => 1,
            DispatchPolicy::Parallel { max_parallelism } => (*max_parallelism).max(1),
        }
    }

    #[inline]
    pub fn is_parallel(&self) -> bool {
        matches!(self, DispatchPolicy::Parallel { .. })
    }
}

/// Parallelism used when `max_parallelism = 0`.
///
/// Derived from the available hardware concurrency, falling back to
/// [`FALLBACK_PARALLELISM`] when it cannot be queried.
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(FALLBACK_PARALLELISM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_parallelism_resolves_to_default() {
        let policy = DispatchPolicy::parallel(0);
        assert_eq!(policy.max_in_flight(), default_parallelism());
        assert!(policy.max_in_flight() >= 1);
    }

    #[test]
    fn test_explicit_parallelism_is_kept() {
        assert_eq!(
            DispatchPolicy::parallel(3),
            DispatchPolicy::Parallel { max_parallelism: 3 }
        );
        assert!(DispatchPolicy::parallel(3).is_parallel());
    }

    #[test]
    fn test_sequential_runs_one_at_a_time() {
        assert_eq!(DispatchPolicy::Sequential.max_in_flight(), 1);
        assert!(!DispatchPolicy::Sequential.is_parallel());
    }

    #[test]
    fn test_default_mode_is_parallel() {
        assert_eq!(SyncMode::default(), SyncMode::Parallel);
    }
}
