//! # Delivery of one raise to a snapshot of subscriptions.
//!
//! The event takes a snapshot of its live subscriptions under its lock, releases the
//! lock and hands the snapshot to [`deliver`]. No lock is held while hooks run, so a
//! subscriber may subscribe, unsubscribe or even raise from inside its notify hook.
//!
//! ```text
//! Event::notify_subscribers()
//!   └─► deliver(policy, snapshot)
//!         ├─ Sequential           → sequential::deliver_sequential (one at a time)
//!         └─ Parallel { K }       → parallel::deliver_parallel     (≤ K in flight)
//!               └─ runner::deliver_once (per subscription)
//!                    ├─ skip if cancelled
//!                    ├─ catch errors and panics
//!                    └─ error hook or Vec<SubscriberFailure>
//! ```

mod parallel;
mod runner;
mod sequential;

use std::time::Duration;

pub(crate) use runner::panic_message;

use crate::error::SubscriberFailure;
use crate::events::Event;
use crate::policies::DispatchPolicy;
use crate::subscriptions::Subscription;

/// Delivers the current raise of `event` to every subscription in `snapshot`.
///
/// Returns once every notify call has completed, with the failures nobody handled.
pub(crate) async fn deliver<A: Send + Sync + 'static>(
    policy: DispatchPolicy,
    event: &Event<A>,
    snapshot: Vec<Subscription<A>>,
    slow: Option<Duration>,
) -> Vec<SubscriberFailure> {
    match policy {
        DispatchPolicy::Sequential => sequential::deliver_sequential(event, &snapshot, slow).await,
        DispatchPolicy::Parallel { max_parallelism } => {
            parallel::deliver_parallel(event, snapshot, max_parallelism, slow).await
        }
    }
}
