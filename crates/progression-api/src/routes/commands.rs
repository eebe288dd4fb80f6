//! The command endpoint.
//!
//! Every command goes through one route; the `command_type` field in the
//! body selects the handler. Rejected and no-op outcomes are successful
//! responses, not errors.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use progression_core::outcome::CommandOutcome;
use progression_core::repository::StoredEvent;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// An appended event as reported to the caller.
#[derive(Debug, Serialize)]
pub struct EventSummary {
    /// Event identifier.
    pub event_id: Uuid,
    /// Stream the event was appended to.
    pub aggregate_id: Uuid,
    /// Event type name.
    pub event_type: String,
    /// Position in the stream.
    pub sequence_number: i64,
    /// Event payload.
    pub payload: serde_json::Value,
    /// Correlation id of the command.
    pub correlation_id: Uuid,
    /// When the event was decided.
    pub occurred_at: DateTime<Utc>,
}

impl From<&StoredEvent> for EventSummary {
    fn from(event: &StoredEvent) -> Self {
        Self {
            event_id: event.event_id,
            aggregate_id: event.aggregate_id,
            event_type: event.event_type.clone(),
            sequence_number: event.sequence_number,
            payload: event.payload.clone(),
            correlation_id: event.correlation_id,
            occurred_at: event.occurred_at,
        }
    }
}

/// Response body for a processed command.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// `applied`, `no_op` or `rejected`.
    pub outcome: &'static str,
    /// Why nothing was appended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Ids of the appended events, in append order.
    pub event_ids: Vec<Uuid>,
    /// The appended events.
    pub events: Vec<EventSummary>,
}

impl From<CommandOutcome> for CommandResponse {
    fn from(outcome: CommandOutcome) -> Self {
        let label = outcome.label();
        match outcome {
            CommandOutcome::Applied { events } => Self {
                outcome: label,
                reason: None,
                event_ids: events.iter().map(|e| e.event_id).collect(),
                events: events.iter().map(EventSummary::from).collect(),
            },
            CommandOutcome::NoOp { reason } | CommandOutcome::Rejected { reason } => Self {
                outcome: label,
                reason: Some(reason),
                event_ids: Vec::new(),
                events: Vec::new(),
            },
        }
    }
}

/// POST /api/v1/commands
async fn submit_command(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = state.dispatcher.parse(body)?;
    let outcome = state.dispatcher.dispatch(&command).await?;
    Ok(Json(CommandResponse::from(outcome)))
}

/// Returns the router for the command endpoint.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(submit_command))
}
