//! In-memory implementation of the `EventRepository` trait.
//!
//! Supports command handler tests and local development without a database.
//! Streams live in a single map behind an async `RwLock`; the write lock
//! serializes appends, which is what makes the version check atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use progression_core::error::DomainError;
use progression_core::repository::{EventRepository, StoredEvent};

use crate::validate_batch;

/// Event repository keeping every stream in process memory.
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    streams: RwLock<HashMap<Uuid, Vec<StoredEvent>>>,
}

impl InMemoryEventRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events across all streams.
    pub async fn total_events(&self) -> usize {
        self.streams.read().await.values().map(Vec::len).sum()
    }

    /// Returns every event of every stream, ordered by stream id then
    /// sequence number.
    pub async fn all_events(&self) -> Vec<StoredEvent> {
        let streams = self.streams.read().await;
        let mut ids: Vec<&Uuid> = streams.keys().collect();
        ids.sort();
        ids.into_iter()
            .flat_map(|id| streams[id].iter().cloned())
            .collect()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self
            .streams
            .read()
            .await
            .get(&aggregate_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<i64, DomainError> {
        validate_batch(aggregate_id, expected_version, events)?;

        let mut streams = self.streams.write().await;
        #[allow(clippy::cast_possible_wrap)]
        let actual = streams.get(&aggregate_id).map_or(0, Vec::len) as i64;
        if actual != expected_version {
            tracing::debug!(
                aggregate_id = %aggregate_id,
                expected = expected_version,
                actual,
                "append rejected by version check"
            );
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }
        if events.is_empty() {
            return Ok(actual);
        }

        let stream = streams.entry(aggregate_id).or_default();
        stream.extend_from_slice(events);
        #[allow(clippy::cast_possible_wrap)]
        let new_version = stream.len() as i64;
        Ok(new_version)
    }

    async fn stream_size(&self, aggregate_id: Uuid) -> Result<i64, DomainError> {
        #[allow(clippy::cast_possible_wrap)]
        let size = self
            .streams
            .read()
            .await
            .get(&aggregate_id)
            .map_or(0, Vec::len) as i64;
        Ok(size)
    }
}
