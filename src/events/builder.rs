use std::borrow::Cow;
use std::marker::PhantomData;
use std::time::Duration;

use crate::config::EventingConfig;
use crate::events::Event;
use crate::events::metadata::EventPriority;
use crate::policies::SyncMode;

/// Builder for constructing an [`Event`] with optional settings.
pub struct EventBuilder<A> {
    name: Cow<'static, str>,
    cfg: EventingConfig,
    priority: EventPriority,
    _args: PhantomData<fn() -> A>,
}

impl<A: Send + Sync + 'static> EventBuilder<A> {
    /// Creates a new builder with the default configuration.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            cfg: EventingConfig::default(),
            priority: EventPriority::default(),
            _args: PhantomData,
        }
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, cfg: EventingConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn with_sync_mode(mut self, mode: SyncMode) -> Self {
        self.cfg.sync_mode = mode;
        self
    }

    /// Sets the parallel bound (`0` = hardware concurrency).
    ///
    /// Has no effect in [`SyncMode::Sequential`].
    pub fn with_max_parallelism(mut self, max_parallelism: usize) -> Self {
        self.cfg.max_parallelism = max_parallelism;
        self
    }

    /// Restricts the event to a single subscriber.
    pub fn single_subscriber(mut self) -> Self {
        self.cfg.allow_multiple_subscribers = false;
        self
    }

    /// Sets the slow-subscriber warning threshold (`Duration::ZERO` disables it).
    pub fn with_slow_subscriber_threshold(mut self, threshold: Duration) -> Self {
        self.cfg.slow_subscriber_threshold = threshold;
        self
    }

    /// Sets the informational priority recorded in the metadata.
    pub fn with_priority(mut self, priority: EventPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Builds the event.
    pub fn build(self) -> Event<A> {
        Event::from_parts(self.name, self.cfg, self.priority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DispatchPolicy;

    #[tokio::test]
    async fn test_builder_applies_settings() {
        let ev: Event<u8> = Event::builder("alerts")
            .with_sync_mode(SyncMode::Parallel)
            .with_max_parallelism(3)
            .with_priority(EventPriority::Critical)
            .single_subscriber()
            .build();

        assert_eq!(ev.name(), "alerts");
        assert_eq!(
            ev.config().dispatch_policy(),
            DispatchPolicy::Parallel { max_parallelism: 3 }
        );
        assert!(!ev.config().allow_multiple_subscribers);
        assert_eq!(ev.metadata().await.priority(), EventPriority::Critical);
    }

    #[test]
    fn test_with_config_replaces_previous_settings() {
        let ev: Event<()> = EventBuilder::new("tick")
            .with_max_parallelism(7)
            .with_config(EventingConfig::sequential())
            .with_slow_subscriber_threshold(Duration::ZERO)
            .build();

        assert_eq!(ev.config().dispatch_policy(), DispatchPolicy::Sequential);
        assert_eq!(ev.config().slow_threshold(), None);
    }
}
