//! Court-case progression API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use progression_api::config::AppConfig;
use progression_api::error::AppError;
use progression_api::state::AppState;
use progression_coordinator::dispatch::CommandDispatcher;
use progression_core::clock::SystemClock;
use progression_core::id::RandomIdGenerator;
use progression_core::repository::EventRepository;
use progression_event_store::memory_event_repository::InMemoryEventRepository;
use progression_event_store::pg_event_repository::PgEventRepository;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting court-case progression API server");

    let config = AppConfig::from_env()?;

    let repo: Arc<dyn EventRepository> = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await?;
            sqlx::migrate!("../../migrations").run(&pool).await?;
            tracing::info!(
                max_connections = config.database_max_connections,
                "using PostgreSQL event store"
            );
            Arc::new(PgEventRepository::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, events are kept in memory only");
            Arc::new(InMemoryEventRepository::new())
        }
    };

    let dispatcher = CommandDispatcher::new(
        repo,
        Arc::new(SystemClock),
        Arc::new(RandomIdGenerator),
    )
    .with_retry_policy(config.retry_policy());
    tracing::info!(commands = ?dispatcher.command_types(), "dispatch table ready");

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = progression_api::app(AppState::new(dispatcher))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
