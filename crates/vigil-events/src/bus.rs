//! In-process broadcast bus implementation of the event channel.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::trace;

use vigil_models::{Event, EventTarget};

use crate::{EventChannel, EventResult};

/// A routed event as seen by subscribers.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub event: Event,
    pub target: EventTarget,
}

/// Tokio broadcast-backed event bus.
///
/// Slow subscribers lag and drop old envelopes rather than back-pressuring
/// producers; a frame relay must never stall the processing loops.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Envelope>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all envelopes; callers filter by target.
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EventChannel for EventBus {
    async fn emit(&self, event: Event, target: EventTarget) -> EventResult<()> {
        trace!(topic = event.topic(), "emit");
        // A send error only means nobody is subscribed; not a failure.
        let _ = self.tx.send(Envelope { event, target });
        Ok(())
    }
}
