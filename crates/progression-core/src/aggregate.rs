//! Aggregate root abstraction.

use uuid::Uuid;

use crate::event::DomainEvent;
use crate::stream::AggregateKind;

/// Trait for aggregate roots that reconstitute from event history.
///
/// `apply` mutates state only; the stream version is tracked separately so
/// that events an aggregate does not understand still count towards it.
pub trait AggregateRoot: Send + Sync {
    /// The event type this aggregate produces and consumes.
    type Event: DomainEvent + Clone;

    /// The kind of stream this aggregate owns.
    const KIND: AggregateKind;

    /// Returns the initial state for a stream with no events.
    fn initial(id: Uuid) -> Self
    where
        Self: Sized;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Returns the current version (number of events in the stream).
    fn version(&self) -> i64;

    /// Records the stream version after replay or a successful append.
    fn set_version(&mut self, version: i64);

    /// Apply an event to mutate internal state (used during reconstitution).
    fn apply(&mut self, event: &Self::Event);

    /// Returns uncommitted events produced by command handling.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Clears uncommitted events after persistence.
    fn clear_uncommitted_events(&mut self);

    /// Returns the sequence number the next staged event should carry.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version() + self.uncommitted_events().len() as i64 + 1
    }
}
