//! Event store implementations.
//!
//! Both stores honour the same contract: per-stream ordering, atomic
//! multi-event appends and optimistic concurrency on the stream version.

pub mod memory_event_repository;
pub mod pg_event_repository;
pub mod schema;

use progression_core::error::DomainError;
use progression_core::repository::StoredEvent;
use uuid::Uuid;

/// Checks that a batch continues the stream at `expected_version` without
/// gaps and belongs to the stream being appended to.
pub(crate) fn validate_batch(
    aggregate_id: Uuid,
    expected_version: i64,
    events: &[StoredEvent],
) -> Result<(), DomainError> {
    for (expected_sequence, event) in (expected_version + 1..).zip(events) {
        if event.aggregate_id != aggregate_id {
            return Err(DomainError::Validation(format!(
                "event {} belongs to stream {}, not {aggregate_id}",
                event.event_id, event.aggregate_id
            )));
        }
        if event.sequence_number != expected_sequence {
            return Err(DomainError::Validation(format!(
                "event {} has sequence number {}, expected {expected_sequence}",
                event.event_id, event.sequence_number
            )));
        }
    }
    Ok(())
}
