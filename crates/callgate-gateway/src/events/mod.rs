//! Audit events: fan-out bus and per-stream statistics windows.

mod bus;
mod stats;

pub use bus::{EventBus, Subscription, SubscriptionId, DEFAULT_QUEUE_CAPACITY};
pub use stats::StatWindow;
