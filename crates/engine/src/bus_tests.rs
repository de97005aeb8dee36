// SPDX-License-Identifier: MIT

#![allow(clippy::unwrap_used)]

use super::*;
use hotswap_ports::{FakeEventSink, SinkBehavior};
use std::time::Duration;

fn degraded(n: usize) -> Event {
    Event::new(0, Payload::SinkDegraded { dropped: n })
}

#[tokio::test]
async fn each_subscriber_sees_published_events_in_order() {
    let bus = EventBus::new();
    let mut a = bus.subscribe(8);
    let mut b = bus.subscribe(8);

    bus.publish(degraded(1));
    bus.publish(degraded(2));

    assert_eq!(a.recv().await.unwrap().payload, Payload::SinkDegraded { dropped: 1 });
    assert_eq!(a.recv().await.unwrap().payload, Payload::SinkDegraded { dropped: 2 });
    assert_eq!(b.recv().await.unwrap().payload, Payload::SinkDegraded { dropped: 1 });
    assert_eq!(b.recv().await.unwrap().payload, Payload::SinkDegraded { dropped: 2 });
}

#[tokio::test]
async fn publish_never_blocks_on_a_full_subscriber() {
    let bus = EventBus::new();
    let _rx = bus.subscribe(1);
    // Fill the mailbox, then publish more; this must return immediately
    // rather than waiting for the subscriber to drain.
    for i in 0..10 {
        bus.publish(degraded(i));
    }
}

#[tokio::test]
async fn sink_relay_forwards_events_to_the_sink() {
    let bus = EventBus::new();
    let (tx, rx) = tokio::sync::mpsc::channel(8);
    let sink: FakeEventSink<Event> = FakeEventSink::new();

    let relay = tokio::spawn(run_sink_relay(
        bus,
        rx,
        sink.clone(),
        16,
        Duration::from_millis(5),
        Duration::from_millis(50),
    ));

    tx.send(degraded(1)).await.unwrap();
    tx.send(degraded(2)).await.unwrap();
    drop(tx);
    relay.await.unwrap();

    assert_eq!(sink.len(), 2);
}

#[tokio::test]
async fn sustained_sink_failure_eventually_emits_sink_degraded() {
    let bus = EventBus::new();
    let mut degraded_rx = bus.subscribe(16);
    let (tx, rx) = tokio::sync::mpsc::channel(8);
    let sink: FakeEventSink<Event> = FakeEventSink::new();
    sink.set_behavior(SinkBehavior::Reject);

    let relay = tokio::spawn(run_sink_relay(
        bus,
        rx,
        sink,
        2,
        Duration::from_millis(2),
        Duration::from_millis(10),
    ));

    for i in 0..5 {
        tx.send(degraded(i)).await.unwrap();
    }

    let saw_degraded = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let event = degraded_rx.recv().await.unwrap();
            if matches!(event.payload, Payload::SinkDegraded { .. }) {
                break;
            }
        }
    })
    .await;
    assert!(saw_degraded.is_ok());

    drop(tx);
    let _ = tokio::time::timeout(Duration::from_secs(1), relay).await;
}