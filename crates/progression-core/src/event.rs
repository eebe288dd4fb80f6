//! Domain event abstractions.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::command::CommandContext;
use crate::error::DomainError;
use crate::repository::StoredEvent;

/// Metadata attached to every domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Type name for deserialization routing.
    pub event_type: String,
    /// Aggregate/stream this event belongs to.
    pub aggregate_id: Uuid,
    /// Monotonically increasing version within the aggregate stream.
    pub sequence_number: i64,
    /// Correlation ID for tracing a command through its effects.
    pub correlation_id: Uuid,
    /// Causation ID linking this event to the event/command that caused it.
    pub causation_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

impl EventMetadata {
    /// Builds metadata for a freshly decided event. The event id and the
    /// timestamp come from the context so decisions stay free of I/O.
    #[must_use]
    pub fn new(
        ctx: &CommandContext<'_>,
        event_type: &str,
        aggregate_id: Uuid,
        sequence_number: i64,
    ) -> Self {
        Self {
            event_id: ctx.ids.next_id(),
            event_type: event_type.to_owned(),
            aggregate_id,
            sequence_number,
            correlation_id: ctx.correlation_id,
            causation_id: ctx.causation_id,
            occurred_at: ctx.clock.now(),
        }
    }

    /// Recovers the metadata half of a stored event.
    #[must_use]
    pub fn from_stored(stored: &StoredEvent) -> Self {
        Self {
            event_id: stored.event_id,
            event_type: stored.event_type.clone(),
            aggregate_id: stored.aggregate_id,
            sequence_number: stored.sequence_number,
            correlation_id: stored.correlation_id,
            causation_id: stored.causation_id,
            occurred_at: stored.occurred_at,
        }
    }
}

/// Trait that all domain events implement.
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Returns the event type name (used for serialization routing).
    fn event_type(&self) -> &'static str;

    /// Serializes the event payload to JSON.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the payload cannot be encoded.
    fn to_payload(&self) -> Result<serde_json::Value, DomainError>;

    /// Returns the metadata for this event.
    fn metadata(&self) -> &EventMetadata;

    /// Decodes a stored event. Returns `Ok(None)` when the event type belongs
    /// to no variant this aggregate knows.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CorruptEvent` when the type is known but the
    /// payload does not decode.
    fn from_stored(stored: &StoredEvent) -> Result<Option<Self>, DomainError>
    where
        Self: Sized;
}

/// Deserializes the payload of a stored event into an event-kind enum.
///
/// # Errors
///
/// Returns `DomainError::CorruptEvent` if the payload does not match `K`.
pub fn decode_payload<K: DeserializeOwned>(stored: &StoredEvent) -> Result<K, DomainError> {
    serde_json::from_value(stored.payload.clone()).map_err(|e| DomainError::CorruptEvent {
        aggregate_id: stored.aggregate_id,
        sequence_number: stored.sequence_number,
        reason: e.to_string(),
    })
}

/// Serializes an event-kind enum into a JSON payload.
///
/// # Errors
///
/// Returns `DomainError::Validation` if serialization fails.
pub fn encode_payload<K: Serialize>(kind: &K) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(kind)
        .map_err(|e| DomainError::Validation(format!("event serialization failed: {e}")))
}

/// Converts a domain event into its stored representation.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the payload cannot be encoded.
pub fn to_stored_event<E: DomainEvent>(event: &E) -> Result<StoredEvent, DomainError> {
    let meta = event.metadata();
    Ok(StoredEvent {
        event_id: meta.event_id,
        aggregate_id: meta.aggregate_id,
        event_type: event.event_type().to_owned(),
        payload: event.to_payload()?,
        sequence_number: meta.sequence_number,
        correlation_id: meta.correlation_id,
        causation_id: meta.causation_id,
        occurred_at: meta.occurred_at,
    })
}
