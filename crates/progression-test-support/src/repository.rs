//! `EventRepository` fakes: recording, failing and fault-injecting.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use progression_core::error::DomainError;
use progression_core::repository::{EventRepository, StoredEvent};
use progression_event_store::memory_event_repository::InMemoryEventRepository;
use uuid::Uuid;

/// One recorded `append_events` call.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendCall {
    /// Stream appended to.
    pub aggregate_id: Uuid,
    /// Version the caller expected.
    pub expected_version: i64,
    /// Events in the batch.
    pub events: Vec<StoredEvent>,
}

/// An in-memory event repository that records every successful
/// `append_events` call in order, across all streams.
#[derive(Debug, Default)]
pub struct RecordingEventRepository {
    inner: InMemoryEventRepository,
    appended: Mutex<Vec<AppendCall>>,
}

impl RecordingEventRepository {
    /// Creates an empty recording repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all successful appends.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended(&self) -> Vec<AppendCall> {
        self.appended.lock().unwrap().clone()
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &InMemoryEventRepository {
        &self.inner
    }
}

#[async_trait]
impl EventRepository for RecordingEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        self.inner.load_events(aggregate_id).await
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<i64, DomainError> {
        let version = self
            .inner
            .append_events(aggregate_id, expected_version, events)
            .await?;
        self.appended.lock().unwrap().push(AppendCall {
            aggregate_id,
            expected_version,
            events: events.to_vec(),
        });
        Ok(version)
    }

    async fn stream_size(&self, aggregate_id: Uuid) -> Result<i64, DomainError> {
        self.inner.stream_size(aggregate_id).await
    }
}

/// An event repository that always returns a stream-unavailable error.
/// Useful for testing error-handling paths.
#[derive(Debug)]
pub struct FailingEventRepository;

#[async_trait]
impl EventRepository for FailingEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::StreamUnavailable("connection refused".into()))
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<i64, DomainError> {
        Err(DomainError::StreamUnavailable("connection refused".into()))
    }

    async fn stream_size(&self, _aggregate_id: Uuid) -> Result<i64, DomainError> {
        Err(DomainError::StreamUnavailable("connection refused".into()))
    }
}

/// A failure to inject into an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Let the append through. Arming this first aims a later fault at a
    /// later append to the same stream.
    PassThrough,
    /// Fail with `StreamUnavailable`; nothing is appended.
    Unavailable,
    /// Let a phantom writer append first, then fail with
    /// `ConcurrencyConflict`. The phantom event has an event type no
    /// aggregate knows, so only the stream version moves.
    Conflict,
}

/// An in-memory repository whose appends to chosen streams fail a set number
/// of times before succeeding. Drives partial-failure and retry tests.
#[derive(Debug, Default)]
pub struct FaultInjectingEventRepository {
    inner: RecordingEventRepository,
    faults: Mutex<HashMap<Uuid, Vec<Fault>>>,
}

impl FaultInjectingEventRepository {
    /// Creates a repository with no faults armed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms `fault` for the next append to `aggregate_id`. Faults for one
    /// stream fire in the order they were armed.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn arm(&self, aggregate_id: Uuid, fault: Fault) {
        self.faults
            .lock()
            .unwrap()
            .entry(aggregate_id)
            .or_default()
            .push(fault);
    }

    /// Returns the recording store underneath the faults.
    #[must_use]
    pub fn recorder(&self) -> &RecordingEventRepository {
        &self.inner
    }

    fn take_fault(&self, aggregate_id: Uuid) -> Option<Fault> {
        let mut faults = self.faults.lock().unwrap();
        let queue = faults.get_mut(&aggregate_id)?;
        if queue.is_empty() {
            None
        } else {
            Some(queue.remove(0))
        }
    }
}

#[async_trait]
impl EventRepository for FaultInjectingEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        self.inner.load_events(aggregate_id).await
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<i64, DomainError> {
        match self.take_fault(aggregate_id) {
            None | Some(Fault::PassThrough) => {
                self.inner
                    .append_events(aggregate_id, expected_version, events)
                    .await
            }
            Some(Fault::Unavailable) => Err(DomainError::StreamUnavailable(format!(
                "injected failure appending to {aggregate_id}"
            ))),
            Some(Fault::Conflict) => {
                let actual = self.inner.stream_size(aggregate_id).await?;
                let phantom = StoredEvent {
                    event_id: Uuid::new_v4(),
                    aggregate_id,
                    event_type: "test.phantom_write".to_owned(),
                    payload: serde_json::Value::Null,
                    sequence_number: actual + 1,
                    correlation_id: Uuid::nil(),
                    causation_id: Uuid::nil(),
                    occurred_at: crate::clock::fixed_now(),
                };
                let actual = self
                    .inner
                    .store()
                    .append_events(aggregate_id, actual, &[phantom])
                    .await?;
                Err(DomainError::ConcurrencyConflict {
                    aggregate_id,
                    expected: expected_version,
                    actual,
                })
            }
        }
    }

    async fn stream_size(&self, aggregate_id: Uuid) -> Result<i64, DomainError> {
        self.inner.stream_size(aggregate_id).await
    }
}
