//! # Per-event bookkeeping.
//!
//! [`EventMetadata`] records who an event is and when it last fired:
//! - `id`: time-ordered UUIDv7, created once with the event
//! - `created_at`: wall-clock creation timestamp (immutable)
//! - `last_fired`: wall-clock timestamp of the latest raise (`None` until the first one)
//! - `priority`: informational [`EventPriority`]; it does **not** affect dispatch order
//! - `last_caller`: opaque [`Caller`] passed to the latest raise (replaced every raise)
//!
//! Only [`Event::raise`](crate::Event::raise) and [`Event::raise_from`](crate::Event::raise_from)
//! advance the metadata. Subscribers read a snapshot through
//! [`Event::metadata`](crate::Event::metadata).

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use uuid::Uuid;

/// Opaque reference to whoever raised an event.
pub type Caller = Arc<dyn Any + Send + Sync>;

/// Informational priority of an event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i8)]
pub enum EventPriority {
    None = -2,
    Low = -1,
    #[default]
    Medium = 0,
    High = 1,
    Critical = 2,
}

impl EventPriority {
    /// Ordinal value of the priority (`None = -2` .. `Critical = 2`).
    #[inline]
    pub fn as_i8(self) -> i8 {
        self as i8
    }
}

/// Snapshot of an event's identity and firing history.
#[derive(Clone)]
pub struct EventMetadata {
    id: Uuid,
    created_at: SystemTime,
    last_fired: Option<SystemTime>,
    priority: EventPriority,
    last_caller: Option<Caller>,
}

impl EventMetadata {
    pub(crate) fn new(priority: EventPriority) -> Self {
        Self {
            id: Uuid::now_v7(),
            created_at: SystemTime::now(),
            last_fired: None,
            priority,
            last_caller: None,
        }
    }

    /// Stamps a raise: `last_fired = now`, `last_caller = caller`.
    pub(crate) fn record_raise(&mut self, caller: Option<Caller>) {
        self.last_fired = Some(SystemTime::now());
        self.last_caller = caller;
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Timestamp of the latest raise, `None` if the event never fired.
    pub fn last_fired(&self) -> Option<SystemTime> {
        self.last_fired
    }

    pub fn priority(&self) -> EventPriority {
        self.priority
    }

    /// Caller passed to the latest raise, if any.
    pub fn last_caller(&self) -> Option<&Caller> {
        self.last_caller.as_ref()
    }

    /// Returns the latest caller downcast to `T`.
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use eventvisor::Event;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> Result<(), eventvisor::EventError> {
    /// let ev: Event = Event::new("tick");
    /// ev.raise_from((), Arc::new(String::from("scheduler"))).await?;
    ///
    /// let meta = ev.metadata().await;
    /// assert_eq!(meta.last_caller_as::<String>().as_deref().map(String::as_str), Some("scheduler"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn last_caller_as<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.last_caller.clone()?.downcast::<T>().ok()
    }
}

impl fmt::Debug for EventMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventMetadata")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("last_fired", &self.last_fired)
            .field("priority", &self.priority)
            .field("has_caller", &self.last_caller.is_some())
            .finish()
    }
}
