//! Read routes for case groups.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use progression_group::application::query_handlers::{GroupView, get_group_by_id};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/v1/groups/{group_id}
async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<GroupView>, ApiError> {
    let view = get_group_by_id(group_id, &state.dispatcher.env()).await?;
    Ok(Json(view))
}

/// Returns the router for group queries.
pub fn router() -> Router<AppState> {
    Router::new().route("/{group_id}", get(get_group))
}
