//! Read routes for cases.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use progression_case::application::query_handlers::{CaseView, get_case_by_id};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/v1/cases/{case_id}
async fn get_case(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
) -> Result<Json<CaseView>, ApiError> {
    let view = get_case_by_id(case_id, &state.dispatcher.env()).await?;
    Ok(Json(view))
}

/// Returns the router for case queries.
pub fn router() -> Router<AppState> {
    Router::new().route("/{case_id}", get(get_case))
}
