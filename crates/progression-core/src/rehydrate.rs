//! Aggregate rehydration and persistence of decisions.

use uuid::Uuid;

use crate::aggregate::AggregateRoot;
use crate::error::DomainError;
use crate::event::{DomainEvent, to_stored_event};
use crate::repository::{EventRepository, StoredEvent};

/// Folds stored events, in order, into a fresh aggregate.
///
/// Events whose type the aggregate does not know are skipped but still
/// counted towards the version.
///
/// # Errors
///
/// Returns `DomainError::CorruptEvent` if a known event fails to decode.
pub fn reconstitute<A: AggregateRoot>(
    aggregate_id: Uuid,
    existing_events: &[StoredEvent],
) -> Result<A, DomainError> {
    let mut aggregate = A::initial(aggregate_id);
    for stored in existing_events {
        match A::Event::from_stored(stored)? {
            Some(event) => aggregate.apply(&event),
            None => tracing::debug!(
                aggregate_id = %aggregate_id,
                event_type = %stored.event_type,
                "ignoring unknown event type during replay"
            ),
        }
    }
    #[allow(clippy::cast_possible_wrap)]
    let version = existing_events.len() as i64;
    aggregate.set_version(version);
    Ok(aggregate)
}

/// Loads a stream and reconstitutes the aggregate that owns it. An empty
/// stream yields the aggregate's initial state.
///
/// # Errors
///
/// Returns `DomainError::StreamUnavailable` if the stream cannot be read, or
/// `DomainError::CorruptEvent` if a known event fails to decode.
pub async fn rehydrate<A: AggregateRoot>(
    repo: &dyn EventRepository,
    aggregate_id: Uuid,
) -> Result<A, DomainError> {
    let existing_events = repo.load_events(aggregate_id).await?;
    reconstitute(aggregate_id, &existing_events)
}

/// Appends the aggregate's uncommitted events, expecting the stream to still
/// be at the version the aggregate was loaded at. On success the staged
/// events are applied to the aggregate, its version advances and the stored
/// events are returned.
///
/// Nothing is appended when there are no staged events.
///
/// # Errors
///
/// Returns `DomainError::ConcurrencyConflict` if another writer appended
/// first, or `DomainError::StreamUnavailable` on storage failure.
pub async fn commit<A: AggregateRoot>(
    repo: &dyn EventRepository,
    aggregate: &mut A,
) -> Result<Vec<StoredEvent>, DomainError> {
    if aggregate.uncommitted_events().is_empty() {
        return Ok(Vec::new());
    }

    let stored_events = aggregate
        .uncommitted_events()
        .iter()
        .map(to_stored_event)
        .collect::<Result<Vec<_>, _>>()?;

    let new_version = repo
        .append_events(aggregate.aggregate_id(), aggregate.version(), &stored_events)
        .await?;

    let staged = aggregate.uncommitted_events().to_vec();
    for event in &staged {
        aggregate.apply(event);
    }
    aggregate.set_version(new_version);
    aggregate.clear_uncommitted_events();

    Ok(stored_events)
}
