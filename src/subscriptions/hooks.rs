//! Boxed hook types shared by requests and subscriptions.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::HookError;
use crate::events::Event;

/// Boxed future returned by async subscriber hooks.
pub type BoxHookFuture = BoxFuture<'static, Result<(), HookError>>;

pub(crate) type NotifyHook<A> = Arc<dyn Fn(Event<A>) -> BoxHookFuture + Send + Sync>;
pub(crate) type SubscribeHook<A> = Arc<dyn Fn(Event<A>) -> BoxHookFuture + Send + Sync>;
pub(crate) type UnsubscribeHook = Arc<dyn Fn() -> BoxHookFuture + Send + Sync>;
pub(crate) type ErrorHook = Arc<dyn Fn(HookError) + Send + Sync>;
