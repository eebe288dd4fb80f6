//! Read routes for civil fees.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use progression_fee::application::query_handlers::{FeeView, get_fee_by_id};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/v1/fees/{fee_id}
async fn get_fee(
    State(state): State<AppState>,
    Path(fee_id): Path<Uuid>,
) -> Result<Json<FeeView>, ApiError> {
    let view = get_fee_by_id(fee_id, &state.dispatcher.env()).await?;
    Ok(Json(view))
}

/// Returns the router for fee queries.
pub fn router() -> Router<AppState> {
    Router::new().route("/{fee_id}", get(get_fee))
}
