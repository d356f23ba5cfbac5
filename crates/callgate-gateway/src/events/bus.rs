//! Audit event fan-out.
//!
//! Each subscription owns a bounded queue. Delivery is `try_send` only, so a
//! subscriber that stops reading can never stall the call path: when its queue
//! is full the new event is dropped *for that subscriber only* and counted.
//!
//! The registry lock is also held while publishing. Delivery never awaits, so
//! the critical section stays short, and every subscriber observes the same
//! global publication order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use callgate_core::protocol::Event;

pub type SubscriptionId = u64;

/// Default per-subscriber queue depth.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

#[derive(Default)]
struct Registry {
    next_id: SubscriptionId,
    subscribers: HashMap<SubscriptionId, mpsc::Sender<Arc<Event>>>,
    /// Set by `teardown_all`; later subscriptions are handed out closed.
    closed: bool,
}

/// Registry of live subscriptions.
pub struct EventBus {
    registry: Mutex<Registry>,
    capacity: usize,
    published: AtomicU64,
    dropped: AtomicU64,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            capacity: capacity.max(1),
            published: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        // Registry operations cannot leave it half-updated; keep serving.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new subscriber. The returned handle is the only reader of
    /// its queue and unsubscribes itself when dropped.
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let (tx, rx) = mpsc::channel(self.capacity);
        let mut reg = self.registry();
        reg.next_id += 1;
        let id = reg.next_id;

        if reg.closed {
            tracing::debug!(subscription = id, "bus torn down; subscription closed at birth");
            drop(tx);
        } else {
            reg.subscribers.insert(id, tx);
            tracing::debug!(subscription = id, live = reg.subscribers.len(), "subscribed");
        }

        Subscription {
            id,
            rx,
            bus: Arc::clone(self),
        }
    }

    /// Close and remove the queue for `id`. Returns false for unknown ids.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.registry().subscribers.remove(&id).is_some();
        if removed {
            tracing::debug!(subscription = id, "unsubscribed");
        }
        removed
    }

    /// Deliver `event` to every subscriber registered right now.
    /// Returns the number of queues that accepted it.
    pub fn publish(&self, event: Event) -> usize {
        let event = Arc::new(event);
        let reg = self.registry();
        self.published.fetch_add(1, Ordering::Relaxed);

        let mut delivered = 0;
        for (id, tx) in reg.subscribers.iter() {
            match tx.try_send(Arc::clone(&event)) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        subscription = *id,
                        method = %event.method,
                        "subscriber queue full; event dropped"
                    );
                }
                // Reader gone but not yet unsubscribed; its drop guard will remove it.
                Err(TrySendError::Closed(_)) => {}
            }
        }
        delivered
    }

    /// Unsubscribe everyone and refuse new subscribers. Used on host shutdown
    /// so that every stream observes queue closure and terminates.
    pub fn teardown_all(&self) -> usize {
        let mut reg = self.registry();
        reg.closed = true;
        let n = reg.subscribers.len();
        reg.subscribers.clear();
        tracing::debug!(subscriptions = n, "bus torn down");
        n
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry().subscribers.len()
    }

    pub fn is_closed(&self) -> bool {
        self.registry().closed
    }

    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

/// One registered observer: id plus exclusive read side of its queue.
pub struct Subscription {
    id: SubscriptionId,
    rx: mpsc::Receiver<Arc<Event>>,
    bus: Arc<EventBus>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Next event in publication order; `None` once the queue is closed
    /// (unsubscribed or torn down) and drained.
    pub async fn recv(&mut self) -> Option<Arc<Event>> {
        self.rx.recv().await
    }

    /// Non-blocking variant of `recv`.
    pub fn try_recv(&mut self) -> Option<Arc<Event>> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(method: &str, consumer: &str) -> Event {
        Event::now(method, consumer, "127.0.0.1:1")
    }

    #[tokio::test]
    async fn fan_out_reaches_every_subscriber_once() {
        let bus = Arc::new(EventBus::default());
        let mut subs: Vec<Subscription> = (0..4).map(|_| bus.subscribe()).collect();

        assert_eq!(bus.publish(ev("/s/A", "c1")), 4);
        for sub in subs.iter_mut() {
            let got = sub.recv().await.unwrap();
            assert_eq!(got.method, "/s/A");
            assert!(sub.try_recv().is_none());
        }

        let removed = subs.remove(1);
        let removed_id = removed.id();
        drop(removed);
        assert!(!bus.unsubscribe(removed_id));

        assert_eq!(bus.publish(ev("/s/B", "c2")), 3);
        for sub in subs.iter_mut() {
            assert_eq!(sub.recv().await.unwrap().method, "/s/B");
            assert!(sub.try_recv().is_none());
        }
    }

    #[tokio::test]
    async fn ids_are_unique_and_increasing() {
        let bus = Arc::new(EventBus::default());
        let a = bus.subscribe();
        let b = bus.subscribe();
        assert!(b.id() > a.id());
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn per_subscriber_fifo() {
        let bus = Arc::new(EventBus::default());
        let mut sub = bus.subscribe();
        for i in 0..10 {
            bus.publish(ev(&format!("/s/{i}"), "c"));
        }
        for i in 0..10 {
            assert_eq!(sub.recv().await.unwrap().method, format!("/s/{i}"));
        }
    }

    #[tokio::test]
    async fn unsubscribe_closes_queue_after_drain() {
        let bus = Arc::new(EventBus::default());
        let mut sub = bus.subscribe();
        bus.publish(ev("/s/A", "c"));
        assert!(bus.unsubscribe(sub.id()));
        assert!(!bus.unsubscribe(sub.id()));
        assert!(!bus.unsubscribe(9999));
        assert_eq!(sub.recv().await.unwrap().method, "/s/A");
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn full_queue_drops_only_for_that_subscriber() {
        let bus = Arc::new(EventBus::new(2));
        let mut slow = bus.subscribe();
        let mut fast = bus.subscribe();

        for i in 0..3 {
            bus.publish(ev(&format!("/s/{i}"), "c"));
            fast.recv().await.unwrap();
        }
        assert_eq!(bus.dropped_count(), 1);
        assert_eq!(bus.published_count(), 3);

        // the oldest two were kept, the newest was dropped
        assert_eq!(slow.recv().await.unwrap().method, "/s/0");
        assert_eq!(slow.recv().await.unwrap().method, "/s/1");
        assert!(slow.try_recv().is_none());
    }

    #[tokio::test]
    async fn teardown_closes_all_and_later_subscriptions() {
        let bus = Arc::new(EventBus::default());
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        assert_eq!(bus.teardown_all(), 2);
        assert!(a.recv().await.is_none());
        assert!(b.recv().await.is_none());
        assert_eq!(bus.subscriber_count(), 0);

        let mut late = bus.subscribe();
        assert!(bus.is_closed());
        assert!(late.recv().await.is_none());
        assert_eq!(bus.publish(ev("/s/A", "c")), 0);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_noop() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(ev("/s/A", "c")), 0);
        assert_eq!(bus.dropped_count(), 0);
    }
}
