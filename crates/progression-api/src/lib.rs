//! Court-case progression API — library target.
//!
//! The binary in `main.rs` and the integration tests share the router built
//! here.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;

use crate::state::AppState;

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/commands", routes::commands::router())
        .nest("/api/v1/cases", routes::cases::router())
        .nest("/api/v1/groups", routes::groups::router())
        .nest("/api/v1/fees", routes::fees::router())
        .with_state(state)
}
