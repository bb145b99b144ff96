//! Event channel abstraction.
//!
//! The engine publishes progress/status events through the `EventChannel`
//! trait and never holds a reference to a concrete transport; a WebSocket
//! or message-broker layer subscribes on the other side.

pub mod bus;

pub use bus::{Envelope, EventBus};

use async_trait::async_trait;
use thiserror::Error;

use vigil_models::{Event, EventTarget};

pub type EventResult<T> = Result<T, EventError>;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("event serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Publish side of the event channel.
///
/// Emission failures are the transport's concern; producers treat them as
/// non-fatal and keep processing.
#[async_trait]
pub trait EventChannel: Send + Sync {
    async fn emit(&self, event: Event, target: EventTarget) -> EventResult<()>;

    /// Convenience: emit to all subscribers.
    async fn broadcast(&self, event: Event) -> EventResult<()> {
        self.emit(event, EventTarget::Broadcast).await
    }
}
