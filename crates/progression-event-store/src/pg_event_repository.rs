//! `PostgreSQL` implementation of the `EventRepository` trait.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use progression_core::error::DomainError;
use progression_core::repository::{EventRepository, StoredEvent};

use crate::schema::UNIQUE_VIOLATION;
use crate::validate_batch;

/// PostgreSQL-backed event repository.
#[derive(Debug, Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    /// Creates a new `PgEventRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn unavailable(err: &sqlx::Error) -> DomainError {
    DomainError::StreamUnavailable(err.to_string())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

fn row_to_stored_event(row: &PgRow) -> Result<StoredEvent, sqlx::Error> {
    Ok(StoredEvent {
        event_id: row.try_get("event_id")?,
        aggregate_id: row.try_get("aggregate_id")?,
        event_type: row.try_get("event_type")?,
        payload: row.try_get("payload")?,
        sequence_number: row.try_get("sequence_number")?,
        correlation_id: row.try_get("correlation_id")?,
        causation_id: row.try_get("causation_id")?,
        occurred_at: row.try_get("occurred_at")?,
    })
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let rows = sqlx::query(
            r"
            SELECT event_id, aggregate_id, event_type, payload, sequence_number,
                   correlation_id, causation_id, occurred_at
            FROM domain_events
            WHERE aggregate_id = $1
            ORDER BY sequence_number ASC
            ",
        )
        .bind(aggregate_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| unavailable(&e))?;

        rows.iter()
            .map(row_to_stored_event)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| unavailable(&e))
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<i64, DomainError> {
        validate_batch(aggregate_id, expected_version, events)?;

        let mut tx = self.pool.begin().await.map_err(|e| unavailable(&e))?;

        let actual: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(sequence_number), 0) FROM domain_events WHERE aggregate_id = $1",
        )
        .bind(aggregate_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unavailable(&e))?;

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

        for event in events {
            let inserted = sqlx::query(
                r"
                INSERT INTO domain_events
                    (event_id, aggregate_id, event_type, payload, sequence_number,
                     correlation_id, causation_id, occurred_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(event.event_id)
            .bind(event.aggregate_id)
            .bind(&event.event_type)
            .bind(&event.payload)
            .bind(event.sequence_number)
            .bind(event.correlation_id)
            .bind(event.causation_id)
            .bind(event.occurred_at)
            .execute(&mut *tx)
            .await;

            if let Err(err) = inserted {
                if is_unique_violation(&err) {
                    // A racing writer committed between our version read and
                    // this insert; the transaction is dropped (rolled back).
                    drop(tx);
                    let actual = self.stream_size(aggregate_id).await?;
                    return Err(DomainError::ConcurrencyConflict {
                        aggregate_id,
                        expected: expected_version,
                        actual,
                    });
                }
                return Err(unavailable(&err));
            }
        }

        tx.commit().await.map_err(|e| unavailable(&e))?;

        #[allow(clippy::cast_possible_wrap)]
        let new_version = expected_version + events.len() as i64;
        Ok(new_version)
    }

    async fn stream_size(&self, aggregate_id: Uuid) -> Result<i64, DomainError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM domain_events WHERE aggregate_id = $1")
            .bind(aggregate_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| unavailable(&e))
    }
}
