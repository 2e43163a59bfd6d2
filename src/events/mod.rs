//! Events: the publishable channel, its builder and its metadata.
//!
//! ## Contents
//! - [`Event`] typed channel owning subscriptions, args and metadata
//! - [`EventBuilder`] optional settings (sync mode, parallelism, priority)
//! - [`EventMetadata`], [`EventPriority`], [`Caller`] identity and firing history
//!
//! Delivery itself lives in `dispatch`; see `dispatch/mod.rs` for the flow.

mod builder;
mod event;
mod metadata;

pub use builder::EventBuilder;
pub use event::Event;
pub use metadata::{Caller, EventMetadata, EventPriority};
