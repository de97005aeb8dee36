// SPDX-License-Identifier: MIT

//! In-process, single-writer-per-stage event dispatcher. Publishing
//! never blocks the emitting component; each subscriber gets its own
//! bounded channel and sees events in the order they were published
//! (per-subscriber FIFO).

use crate::event::{Event, Payload};
use std::collections::VecDeque;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct EventBus {
    subscribers: std::sync::Arc<parking_lot::Mutex<Vec<mpsc::Sender<Event>>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: std::sync::Arc::new(parking_lot::Mutex::new(Vec::new())),
        }
    }

    /// Register a new subscriber with its own bounded mailbox.
    pub fn subscribe(&self, capacity: usize) -> mpsc::Receiver<Event> {
        let (tx, rx) = mpsc::channel(capacity);
        self.subscribers.lock().push(tx);
        rx
    }

    /// Publish to every subscriber. Never awaits: a full subscriber
    /// mailbox simply misses the event rather than stalling the caller.
    pub fn publish(&self, event: Event) {
        let subs = self.subscribers.lock();
        for sub in subs.iter() {
            let _ = sub.try_send(event.clone());
        }
    }
}

/// Local buffer used while forwarding events to the external sink.
/// Bounded; once full, the oldest buffered event is dropped to make
/// room for the newest.
struct SinkBuffer {
    capacity: usize,
    events: VecDeque<Event>,
    dropped_total: usize,
}

impl SinkBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            events: VecDeque::new(),
            dropped_total: 0,
        }
    }

    fn push(&mut self, event: Event) {
        if self.events.len() >= self.capacity {
            self.events.pop_front();
            self.dropped_total += 1;
        }
        self.events.push_back(event);
    }

    fn drain(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }

    fn requeue_front(&mut self, events: Vec<Event>) {
        for event in events.into_iter().rev() {
            self.events.push_front(event);
        }
    }
}

/// Forwards events from one bus subscription to the external sink,
/// retrying with exponential backoff on failure and buffering locally up
/// to a bound; on sustained failure it drops the oldest buffered event
/// and emits `SinkDegraded` back onto the bus.
pub async fn run_sink_relay<S>(
    bus: EventBus,
    mut rx: mpsc::Receiver<Event>,
    sink: S,
    buffer_capacity: usize,
    initial_backoff: std::time::Duration,
    max_backoff: std::time::Duration,
) where
    S: hotswap_ports::EventSink<Event>,
{
    let mut buffer = SinkBuffer::new(buffer_capacity);
    let mut backoff = initial_backoff;

    loop {
        tokio::select! {
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(event) => buffer.push(event),
                    None => break,
                }
            }
            _ = tokio::time::sleep(backoff), if !buffer.events.is_empty() => {}
        }

        if buffer.events.is_empty() {
            continue;
        }

        let pending = buffer.drain();
        match sink.send_batch(pending.clone()).await {
            Ok(()) => {
                backoff = initial_backoff;
            }
            Err(_) => {
                buffer.requeue_front(pending);
                let before = buffer.dropped_total;
                // Force at least one eviction so sustained failure makes
                // forward progress instead of growing unboundedly.
                if buffer.events.len() >= buffer.capacity {
                    buffer.events.pop_front();
                    buffer.dropped_total += 1;
                }
                if buffer.dropped_total > before {
                    bus.publish(Event::new(
                        0,
                        Payload::SinkDegraded {
                            dropped: buffer.dropped_total,
                        },
                    ));
                }
                backoff = (backoff * 2).min(max_backoff);
            }
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;