//! Domain error types.
//!
//! Business-rule refusals are not errors; they are reported through
//! [`crate::outcome::CommandOutcome::Rejected`]. Only infrastructure failures,
//! concurrency conflicts and malformed command data surface here.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A query targeted a stream with no events.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// Command data is malformed or references something absent from the
    /// aggregate state.
    #[error("validation error: {0}")]
    Validation(String),

    /// The event store could not be reached or failed mid-operation.
    #[error("stream unavailable: {0}")]
    StreamUnavailable(String),

    /// A stored event of a known type carries a payload that does not decode.
    #[error("corrupt event {sequence_number} in stream {aggregate_id}: {reason}")]
    CorruptEvent {
        /// The stream holding the event.
        aggregate_id: Uuid,
        /// Position of the event within the stream.
        sequence_number: i64,
        /// Decoder message.
        reason: String,
    },

    /// No dispatch route is registered for the command type.
    #[error("unknown command type: {0}")]
    UnknownCommand(String),
}

impl DomainError {
    /// Returns `true` for failures a caller may retry without changing the
    /// command.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConcurrencyConflict { .. } | Self::StreamUnavailable(_)
        )
    }
}
