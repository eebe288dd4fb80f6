//! Command abstractions.

use uuid::Uuid;

use crate::clock::Clock;
use crate::guard::IdempotencyGuard;
use crate::id::IdGenerator;
use crate::repository::EventRepository;
use crate::stream::{AggregateKind, StreamRegistry};

/// Trait that all commands implement.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command (for logging/routing).
    fn command_type(&self) -> &'static str;

    /// Correlation ID to trace this command through the system.
    fn correlation_id(&self) -> Uuid;
}

/// Everything a decision needs from the outside world, passed in by value so
/// aggregate methods never touch the clock or a random source themselves.
#[derive(Clone, Copy)]
pub struct CommandContext<'a> {
    /// Correlation ID copied onto every emitted event.
    pub correlation_id: Uuid,
    /// Causation ID copied onto every emitted event.
    pub causation_id: Uuid,
    /// Time source for `occurred_at`.
    pub clock: &'a dyn Clock,
    /// Source of event ids and newly minted entity ids.
    pub ids: &'a dyn IdGenerator,
}

impl<'a> CommandContext<'a> {
    /// Creates a context whose causation ID is the correlation ID, which is
    /// the case for every command entering from the dispatcher.
    #[must_use]
    pub fn new(correlation_id: Uuid, clock: &'a dyn Clock, ids: &'a dyn IdGenerator) -> Self {
        Self {
            correlation_id,
            causation_id: correlation_id,
            clock,
            ids,
        }
    }
}

impl std::fmt::Debug for CommandContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("correlation_id", &self.correlation_id)
            .field("causation_id", &self.causation_id)
            .finish_non_exhaustive()
    }
}

/// The collaborators a command handler works against.
#[derive(Clone, Copy)]
pub struct HandlerEnv<'a> {
    /// Event store.
    pub repo: &'a dyn EventRepository,
    /// Time source.
    pub clock: &'a dyn Clock,
    /// Id source.
    pub ids: &'a dyn IdGenerator,
    /// Stream ownership rules.
    pub streams: &'a StreamRegistry,
}

impl<'a> HandlerEnv<'a> {
    /// Builds the decision context for a command with `correlation_id`.
    #[must_use]
    pub fn context(&self, correlation_id: Uuid) -> CommandContext<'a> {
        CommandContext::new(correlation_id, self.clock, self.ids)
    }

    /// Returns the stream id owned by `kind` for `entity_id`.
    #[must_use]
    pub fn stream_id(&self, kind: AggregateKind, entity_id: Uuid) -> Uuid {
        self.streams.stream_id(kind, entity_id)
    }

    /// Returns an idempotency guard over this environment's store.
    #[must_use]
    pub fn guard(&self) -> IdempotencyGuard<'a> {
        IdempotencyGuard::new(self.repo)
    }
}

impl std::fmt::Debug for HandlerEnv<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerEnv")
            .field("streams", self.streams)
            .finish_non_exhaustive()
    }
}
