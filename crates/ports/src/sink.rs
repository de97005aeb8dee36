// SPDX-License-Identifier: MIT

//! The abstract event sink. A single, write-only port; the core never
//! reads back from it. Generic over the event type so this crate does
//! not need to depend on the pipeline's `Event` definition.

use async_trait::async_trait;

#[derive(Debug, Clone, thiserror::Error)]
#[error("event sink rejected delivery: {0}")]
pub struct SinkError(pub String);

#[async_trait]
pub trait EventSink<E>: Clone + Send + Sync + 'static
where
    E: Send + 'static,
{
    async fn send(&self, event: E) -> Result<(), SinkError>;

    async fn send_batch(&self, events: Vec<E>) -> Result<(), SinkError> {
        for event in events {
            self.send(event).await?;
        }
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum SinkBehavior {
        Accept,
        Reject,
    }

    /// Records every event delivered to it; tests assert against
    /// [`FakeEventSink::events`]. `set_behavior(Reject)` simulates a sink
    /// outage for backpressure/retry tests.
    pub struct FakeEventSink<E> {
        events: Arc<Mutex<Vec<E>>>,
        behavior: Arc<Mutex<SinkBehavior>>,
    }

    impl<E> Clone for FakeEventSink<E> {
        fn clone(&self) -> Self {
            Self {
                events: self.events.clone(),
                behavior: self.behavior.clone(),
            }
        }
    }

    impl<E> Default for FakeEventSink<E> {
        fn default() -> Self {
            Self {
                events: Arc::new(Mutex::new(Vec::new())),
                behavior: Arc::new(Mutex::new(SinkBehavior::Accept)),
            }
        }
    }

    impl<E: Clone> FakeEventSink<E> {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_behavior(&self, behavior: SinkBehavior) {
            *self.behavior.lock() = behavior;
        }

        pub fn events(&self) -> Vec<E> {
            self.events.lock().clone()
        }

        pub fn len(&self) -> usize {
            self.events.lock().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    #[async_trait]
    impl<E: Clone + Send + Sync + 'static> EventSink<E> for FakeEventSink<E> {
        async fn send(&self, event: E) -> Result<(), SinkError> {
            if *self.behavior.lock() == SinkBehavior::Reject {
                return Err(SinkError("fake sink configured to reject".into()));
            }
            self.events.lock().push(event);
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;