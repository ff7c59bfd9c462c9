//! Pending event queue and the dispatcher lock that serializes access to it.
//!
//! The queue holds envelopes created while disconnected or pre-handshake.
//! The `tokio::sync::Mutex` wrapping it doubles as the dispatch lock: a
//! drain holds it for its entire duration, so any `send()` arriving
//! mid-drain parks on the lock and transmits only after the queue is empty.
//! That single lock is what preserves FIFO order across the handshake
//! boundary.

use std::collections::VecDeque;

use tether_protocol::Envelope;
use tokio::sync::{Mutex, MutexGuard};

/// FIFO buffer of envelopes awaiting transmission.
///
/// Capped: when full, the oldest envelope is dropped and counted, so a
/// long-disconnected client sheds its stalest telemetry first instead of
/// growing without bound.
pub struct PendingQueue {
    events: VecDeque<Envelope>,
    max_events: usize,
    dropped: u64,
}

impl PendingQueue {
    fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::new(),
            max_events,
            dropped: 0,
        }
    }

    /// Append an envelope, evicting the oldest entry when at capacity.
    pub fn push(&mut self, envelope: Envelope) {
        if self.max_events > 0 && self.events.len() >= self.max_events {
            self.events.pop_front();
            self.dropped += 1;
            tracing::warn!(
                max_events = self.max_events,
                dropped_total = self.dropped,
                "pending queue full, dropping oldest event"
            );
        }
        self.events.push_back(envelope);
    }

    /// Put an envelope back at the head after a failed hand-off.
    pub fn push_front(&mut self, envelope: Envelope) {
        self.events.push_front(envelope);
    }

    /// Remove and return the oldest envelope.
    pub fn pop(&mut self) -> Option<Envelope> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Envelopes evicted due to the capacity cap since construction.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// The dispatcher: an async lock over the pending queue.
///
/// Holding the guard is the exclusive right to transmit; both the
/// immediate-send path and the drain path acquire it, so no event overtakes
/// another and nothing interleaves mid-drain.
pub struct Dispatcher {
    queue: Mutex<PendingQueue>,
}

impl Dispatcher {
    pub fn new(max_pending_events: usize) -> Self {
        Self {
            queue: Mutex::new(PendingQueue::new(max_pending_events)),
        }
    }

    /// Acquire exclusive dispatch access. Cooperative: waiting yields.
    pub async fn lock(&self) -> MutexGuard<'_, PendingQueue> {
        self.queue.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(event_type: &str) -> Envelope {
        Envelope::new("inst", "", event_type, serde_json::Value::Null)
    }

    #[tokio::test]
    async fn preserves_insertion_order() {
        let dispatcher = Dispatcher::new(100);
        let mut q = dispatcher.lock().await;
        q.push(env("A"));
        q.push(env("B"));
        q.push(env("C"));

        assert_eq!(q.pop().unwrap().event_type, "A");
        assert_eq!(q.pop().unwrap().event_type, "B");
        assert_eq!(q.pop().unwrap().event_type, "C");
        assert!(q.is_empty());
    }

    #[tokio::test]
    async fn evicts_oldest_when_full() {
        let dispatcher = Dispatcher::new(2);
        let mut q = dispatcher.lock().await;
        q.push(env("A"));
        q.push(env("B"));
        q.push(env("C"));

        assert_eq!(q.len(), 2);
        assert_eq!(q.dropped(), 1);
        assert_eq!(q.pop().unwrap().event_type, "B");
        assert_eq!(q.pop().unwrap().event_type, "C");
    }

    #[tokio::test]
    async fn push_front_restores_head() {
        let dispatcher = Dispatcher::new(10);
        let mut q = dispatcher.lock().await;
        q.push(env("B"));
        q.push_front(env("A"));
        assert_eq!(q.pop().unwrap().event_type, "A");
        assert_eq!(q.pop().unwrap().event_type, "B");
    }

    #[tokio::test]
    async fn zero_cap_means_unbounded() {
        let dispatcher = Dispatcher::new(0);
        let mut q = dispatcher.lock().await;
        for i in 0..1000 {
            q.push(env(&format!("E{i}")));
        }
        assert_eq!(q.len(), 1000);
        assert_eq!(q.dropped(), 0);
    }
}
