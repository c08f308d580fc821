use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
#[error("failed to publish {topic} for room {room_id}")]
pub struct PublishError {
    pub room_id: Uuid,
    pub topic: String,
}

/// Outbound room notifications. The engine treats publishing as best
/// effort: a failed publish is logged and never fails the operation
/// that triggered it.
pub trait Publisher: Send + Sync {
    fn publish(&self, room_id: Uuid, topic: &str, payload: Value) -> Result<(), PublishError>;
}

/// Default publisher that writes events to the tracing log.
pub struct LogPublisher;

impl Publisher for LogPublisher {
    fn publish(&self, room_id: Uuid, topic: &str, payload: Value) -> Result<(), PublishError> {
        debug!(%room_id, topic, %payload, "room event");
        Ok(())
    }
}
