//! # Eventing configuration.
//!
//! Provides [`EventingConfig`] settings that govern how an [`Event`](crate::Event)
//! admits subscribers and delivers notifications.
//!
//! Config is supplied once, when the event is constructed:
//! 1. **Defaults**: `Event::new(name)`
//! 2. **Explicit**: `Event::with_config(name, cfg)` or `Event::builder(name).with_config(cfg)`
//!
//! There is no process-wide configuration; every event owns a copy and each
//! notification pass snapshots the resolved [`DispatchPolicy`] before it starts.
//!
//! ## Sentinel values
//! - `max_parallelism = 0` → hardware concurrency (fallback [`FALLBACK_PARALLELISM`](crate::FALLBACK_PARALLELISM))
//! - `slow_subscriber_threshold = 0s` → slow-subscriber warnings disabled

use std::time::Duration;

use crate::policies::{DispatchPolicy, SyncMode};

/// Configuration for one event.
///
/// ## Field semantics
/// - `sync_mode`: Sequential or parallel delivery
/// - `max_parallelism`: Max notify calls in flight in parallel mode (`0` = default)
/// - `allow_multiple_subscribers`: When `false`, a second subscription is rejected
/// - `slow_subscriber_threshold`: Warn when one notify call takes longer (`0s` = off)
///
/// ## Notes
/// All fields are public for flexibility. Prefer using helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventingConfig {
    /// Delivery mode for notifications.
    pub sync_mode: SyncMode,

    /// Maximum number of subscribers notified concurrently.
    ///
    /// - `0` = derived from available hardware concurrency
    /// - `n > 0` = at most `n` notify calls in flight
    ///
    /// Ignored in [`SyncMode::Sequential`].
    pub max_parallelism: usize,

    /// Whether more than one subscriber may be registered at a time.
    pub allow_multiple_subscribers: bool,

    /// Duration after which a running notify call is reported as slow.
    ///
    /// Diagnostic only: delivery order and concurrency are not affected.
    pub slow_subscriber_threshold: Duration,
}

impl EventingConfig {
    /// Sequential delivery with every other field at its default.
    pub fn sequential() -> Self {
        Self {
            sync_mode: SyncMode::Sequential,
            ..Self::default()
        }
    }

    /// Parallel delivery bounded at `max_parallelism` (`0` = default).
    pub fn parallel(max_parallelism: usize) -> Self {
        Self {
            sync_mode: SyncMode::Parallel,
            max_parallelism,
            ..Self::default()
        }
    }

    /// Resolves the dispatch strategy described by this config.
    #[inline]
    pub fn dispatch_policy(&self) -> DispatchPolicy {
        match self.sync_mode {
            SyncMode::Sequential => DispatchPolicy::Sequential,
            SyncMode::Parallel => DispatchPolicy::parallel(self.max_parallelism),
        }
    }

    /// Returns the slow-subscriber threshold as an `Option`.
    ///
    /// - `None` → warnings disabled
    /// - `Some(d)` → warn when a notify call runs longer than `d`
    #[inline]
    pub fn slow_threshold(&self) -> Option<Duration> {
        if self.slow_subscriber_threshold == Duration::ZERO {
            None
        } else {
            Some(self.slow_subscriber_threshold)
        }
    }
}

impl Default for EventingConfig {
    /// Default configuration:
    ///
    /// - `sync_mode = SyncMode::Parallel`
    /// - `max_parallelism = 0` (hardware concurrency)
    /// - `allow_multiple_subscribers = true`
    /// - `slow_subscriber_threshold = 1s`
    fn default() -> Self {
        Self {
            sync_mode: SyncMode::default(),
            max_parallelism: 0,
            allow_multiple_subscribers: true,
            slow_subscriber_threshold: Duration::from_secs(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = EventingConfig::default();
        assert_eq!(cfg.sync_mode, SyncMode::Parallel);
        assert!(cfg.allow_multiple_subscribers);
        assert_eq!(cfg.slow_threshold(), Some(Duration::from_secs(1)));
        assert!(cfg.dispatch_policy().is_parallel());
    }

    #[test]
    fn test_sequential_ignores_parallelism() {
        let cfg = EventingConfig {
            max_parallelism: 8,
            ..EventingConfig::sequential()
        };
        assert_eq!(cfg.dispatch_policy(), DispatchPolicy::Sequential);
    }

    #[test]
    fn test_parallel_bound() {
        let cfg = EventingConfig::parallel(2);
        assert_eq!(
            cfg.dispatch_policy(),
            DispatchPolicy::Parallel { max_parallelism: 2 }
        );
    }

    #[test]
    fn test_zero_threshold_disables_warnings() {
        let cfg = EventingConfig {
            slow_subscriber_threshold: Duration::ZERO,
            ..EventingConfig::default()
        };
        assert_eq!(cfg.slow_threshold(), None);
    }
}
