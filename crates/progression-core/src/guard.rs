//! Idempotency guard for stream-creating commands.
//!
//! Under at-least-once delivery a creation command may arrive twice. Before
//! creating a stream the caller asks whether it already has events; if so the
//! effect is already durable and the caller takes its "already exists"
//! branch. Only the stream length is inspected, so a stream created by a
//! different command looks the same as a duplicate. Two racing creators can
//! both see `Absent`; the loser's append then fails the version check and its
//! retry sees `Exists`.

use uuid::Uuid;

use crate::error::DomainError;
use crate::repository::EventRepository;

/// Whether a stream already holds events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPresence {
    /// The stream is empty; the entity has not been created.
    Absent,
    /// The stream has events.
    Exists {
        /// Current stream version.
        version: i64,
    },
}

impl StreamPresence {
    /// Returns `true` if the stream has events.
    #[must_use]
    pub fn exists(self) -> bool {
        matches!(self, Self::Exists { .. })
    }
}

/// Pre-append check that detects an already-created stream without a replay.
#[derive(Clone, Copy)]
pub struct IdempotencyGuard<'a> {
    repo: &'a dyn EventRepository,
}

impl<'a> IdempotencyGuard<'a> {
    /// Creates a guard over `repo`.
    #[must_use]
    pub fn new(repo: &'a dyn EventRepository) -> Self {
        Self { repo }
    }

    /// Reports whether `stream_id` already holds events.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::StreamUnavailable` if the size query fails.
    pub async fn check(&self, stream_id: Uuid) -> Result<StreamPresence, DomainError> {
        let version = self.repo.stream_size(stream_id).await?;
        if version > 0 {
            tracing::debug!(stream_id = %stream_id, version, "stream already exists");
            Ok(StreamPresence::Exists { version })
        } else {
            Ok(StreamPresence::Absent)
        }
    }
}

impl std::fmt::Debug for IdempotencyGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdempotencyGuard").finish_non_exhaustive()
    }
}
