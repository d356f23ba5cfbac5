//! Per-subscription statistics window.

use std::collections::BTreeMap;

use callgate_core::protocol::{unix_now, Event, StatSnapshot};

/// Counts events by method and by consumer until the next `collect`.
/// Owned by exactly one stream task, so no synchronization is needed.
#[derive(Debug, Default)]
pub struct StatWindow {
    by_method: BTreeMap<String, u64>,
    by_consumer: BTreeMap<String, u64>,
}

impl StatWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, event: &Event) {
        *self.by_method.entry(event.method.clone()).or_insert(0) += 1;
        *self.by_consumer.entry(event.consumer.clone()).or_insert(0) += 1;
    }

    /// Snapshot the counters stamped with the current time, then reset them.
    pub fn collect(&mut self) -> StatSnapshot {
        StatSnapshot {
            timestamp_unix: unix_now(),
            count_by_method: std::mem::take(&mut self.by_method),
            count_by_consumer: std::mem::take(&mut self.by_consumer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(method: &str, consumer: &str) -> Event {
        Event::now(method, consumer, "")
    }

    #[test]
    fn counts_by_method_and_consumer() {
        let mut w = StatWindow::new();
        w.update(&ev("/s/A", "c1"));
        w.update(&ev("/s/A", "c2"));
        w.update(&ev("/s/B", "c1"));

        let snap = w.collect();
        assert_eq!(snap.count_by_method.get("/s/A"), Some(&2));
        assert_eq!(snap.count_by_method.get("/s/B"), Some(&1));
        assert_eq!(snap.count_by_consumer.get("c1"), Some(&2));
        assert_eq!(snap.count_by_consumer.get("c2"), Some(&1));
        assert_eq!(snap.total(), 3);
        assert!(snap.timestamp_unix > 0);
    }

    #[test]
    fn collect_resets() {
        let mut w = StatWindow::new();
        w.update(&ev("/s/A", "c1"));
        assert_eq!(w.collect().total(), 1);

        let second = w.collect();
        assert!(second.is_empty());
        assert_eq!(second.total(), 0);

        w.update(&ev("/s/B", "c2"));
        let third = w.collect();
        assert_eq!(third.total(), 1);
        assert!(third.count_by_method.get("/s/A").is_none());
    }
}
