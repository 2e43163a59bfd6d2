//! # LogWriter: tracing subscriber for any event
//!
//! A minimal [`Subscriber`] that writes every lifecycle step and notification to
//! `tracing` at `INFO`. Use it for tests or demos.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO eventvisor::subscriptions::log: [subscribed] event="orders"
//! INFO eventvisor::subscriptions::log: [notify] event="orders" id=0192… priority=Medium args=Some(7)
//! INFO eventvisor::subscriptions::log: [unsubscribed] subscriber="LogWriter"
//! ```

use std::fmt;

use async_trait::async_trait;
use tracing::info;

use crate::error::HookError;
use crate::events::Event;
use crate::subscriptions::Subscriber;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl<A> Subscriber<A> for LogWriter
where
    A: fmt::Debug + Send + Sync + 'static,
{
    async fn on_notify(&self, event: &Event<A>) -> Result<(), HookError> {
        let meta = event.metadata().await;
        let args = event.args().await;
        info!(
            event = %event.name(),
            id = %meta.id(),
            priority = ?meta.priority(),
            args = ?args,
            "[notify]"
        );
        Ok(())
    }

    async fn on_subscribe(&self, event: &Event<A>) -> Result<(), HookError> {
        info!(event = %event.name(), "[subscribed]");
        Ok(())
    }

    async fn on_unsubscribe(&self) -> Result<(), HookError> {
        info!(subscriber = "LogWriter", "[unsubscribed]");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
