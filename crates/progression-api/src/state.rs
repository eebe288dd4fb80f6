//! Shared application state.

use std::sync::Arc;

use progression_coordinator::dispatch::CommandDispatcher;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Routes commands and provides the read environment for queries.
    pub dispatcher: Arc<CommandDispatcher>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(dispatcher: CommandDispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }
}
