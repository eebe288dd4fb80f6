//! Command dispatch.
//!
//! Routing is a table from command type to handler rather than one
//! hand-written entry point per command. Every route runs inside the
//! conflict retry loop.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use progression_case::application::command_handlers::{
    handle_create_case, handle_eject_case, handle_update_defendant_legal_status,
};
use progression_case::domain::commands::{CreateCase, EjectCase, UpdateDefendantLegalStatus};
use progression_core::clock::Clock;
use progression_core::command::{Command, HandlerEnv};
use progression_core::error::DomainError;
use progression_core::id::IdGenerator;
use progression_core::outcome::CommandOutcome;
use progression_core::repository::EventRepository;
use progression_core::stream::{AggregateKind, StreamRegistry};
use progression_fee::application::command_handlers::handle_update_fee_status;
use progression_fee::domain::commands::{AddCivilFee, UpdateFeeStatus};
use progression_group::domain::commands::{AddCaseToGroup, RemoveCaseFromGroup};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::retry::{RetryPolicy, retry_on_conflict};
use crate::sagas::add_case_to_group::add_case_to_group;
use crate::sagas::add_civil_fee::add_civil_fee;
use crate::sagas::remove_case_from_group::remove_case_from_group;

/// Every command the service accepts, tagged by `command_type` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command_type")]
pub enum ProgressionCommand {
    /// Create a case.
    #[serde(rename = "case.create_case")]
    CreateCase(CreateCase),
    /// Record a defendant's legal status.
    #[serde(rename = "case.update_defendant_legal_status")]
    UpdateDefendantLegalStatus(UpdateDefendantLegalStatus),
    /// Eject a case.
    #[serde(rename = "case.eject_case")]
    EjectCase(EjectCase),
    /// Add a civil fee to a case.
    #[serde(rename = "fee.add_civil_fee")]
    AddCivilFee(AddCivilFee),
    /// Change a fee's status.
    #[serde(rename = "fee.update_fee_status")]
    UpdateFeeStatus(UpdateFeeStatus),
    /// Create a case inside a group.
    #[serde(rename = "group.add_case_to_group")]
    AddCaseToGroup(AddCaseToGroup),
    /// Remove a case from its group.
    #[serde(rename = "group.remove_case_from_group")]
    RemoveCaseFromGroup(RemoveCaseFromGroup),
}

impl ProgressionCommand {
    fn inner(&self) -> &dyn Command {
        match self {
            Self::CreateCase(c) => c,
            Self::UpdateDefendantLegalStatus(c) => c,
            Self::EjectCase(c) => c,
            Self::AddCivilFee(c) => c,
            Self::UpdateFeeStatus(c) => c,
            Self::AddCaseToGroup(c) => c,
            Self::RemoveCaseFromGroup(c) => c,
        }
    }
}

impl Command for ProgressionCommand {
    fn command_type(&self) -> &'static str {
        self.inner().command_type()
    }

    fn correlation_id(&self) -> Uuid {
        self.inner().correlation_id()
    }
}

/// Signature shared by every route handler.
pub type RouteHandler = for<'a> fn(
    &'a ProgressionCommand,
    HandlerEnv<'a>,
) -> BoxFuture<'a, Result<CommandOutcome, DomainError>>;

/// One entry in the dispatch table.
#[derive(Clone, Copy)]
pub struct Route {
    /// The aggregate kinds whose streams the command may append to.
    pub touches: &'static [AggregateKind],
    handler: RouteHandler,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("touches", &self.touches)
            .finish_non_exhaustive()
    }
}

/// Builds a [`RouteHandler`] that unwraps one `ProgressionCommand` variant
/// and hands it to `$handler`.
macro_rules! route {
    ($variant:ident => $handler:path, touches: [$($kind:ident),+]) => {{
        fn adapter<'a>(
            command: &'a ProgressionCommand,
            env: HandlerEnv<'a>,
        ) -> BoxFuture<'a, Result<CommandOutcome, DomainError>> {
            Box::pin(async move {
                match command {
                    ProgressionCommand::$variant(inner) => $handler(inner, &env).await,
                    other => Err(DomainError::UnknownCommand(format!(
                        "{} routed to {}",
                        other.command_type(),
                        stringify!($variant)
                    ))),
                }
            })
        }
        Route {
            touches: &[$(AggregateKind::$kind),+],
            handler: adapter,
        }
    }};
}

/// Entry point for every command: owns the store, the clock, the id source,
/// the stream registry, the retry policy and the dispatch table.
pub struct CommandDispatcher {
    repo: Arc<dyn EventRepository>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    streams: StreamRegistry,
    retry: RetryPolicy,
    routes: HashMap<&'static str, Route>,
}

impl CommandDispatcher {
    /// Creates a dispatcher with the default stream registry and retry
    /// policy.
    #[must_use]
    pub fn new(
        repo: Arc<dyn EventRepository>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let routes = HashMap::from([
            (
                "case.create_case",
                route!(CreateCase => handle_create_case, touches: [Case]),
            ),
            (
                "case.update_defendant_legal_status",
                route!(
                    UpdateDefendantLegalStatus => handle_update_defendant_legal_status,
                    touches: [Case]
                ),
            ),
            (
                "case.eject_case",
                route!(EjectCase => handle_eject_case, touches: [Case]),
            ),
            (
                "fee.add_civil_fee",
                route!(AddCivilFee => add_civil_fee, touches: [Fee, Case]),
            ),
            (
                "fee.update_fee_status",
                route!(UpdateFeeStatus => handle_update_fee_status, touches: [Fee]),
            ),
            (
                "group.add_case_to_group",
                route!(AddCaseToGroup => add_case_to_group, touches: [Case, Group]),
            ),
            (
                "group.remove_case_from_group",
                route!(
                    RemoveCaseFromGroup => remove_case_from_group,
                    touches: [Case, Fee, Group]
                ),
            ),
        ]);

        Self {
            repo,
            clock,
            ids,
            streams: StreamRegistry::default(),
            retry: RetryPolicy::default(),
            routes,
        }
    }

    /// Replaces the stream registry.
    #[must_use]
    pub fn with_streams(mut self, streams: StreamRegistry) -> Self {
        self.streams = streams;
        self
    }

    /// Replaces the conflict retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The collaborators handlers and queries run against.
    #[must_use]
    pub fn env(&self) -> HandlerEnv<'_> {
        HandlerEnv {
            repo: self.repo.as_ref(),
            clock: self.clock.as_ref(),
            ids: self.ids.as_ref(),
            streams: &self.streams,
        }
    }

    /// Returns the route registered for `command_type`, if any.
    #[must_use]
    pub fn route(&self, command_type: &str) -> Option<&Route> {
        self.routes.get(command_type)
    }

    /// Registered command types, sorted.
    #[must_use]
    pub fn command_types(&self) -> Vec<&'static str> {
        let mut types: Vec<&'static str> = self.routes.keys().copied().collect();
        types.sort_unstable();
        types
    }

    /// Decodes a JSON command, distinguishing an unrouted `command_type`
    /// from a malformed body.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnknownCommand` if the type has no route, or
    /// `DomainError::Validation` if the body does not decode.
    pub fn parse(&self, body: serde_json::Value) -> Result<ProgressionCommand, DomainError> {
        let command_type = body
            .get("command_type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| DomainError::Validation("missing command_type".into()))?;
        if !self.routes.contains_key(command_type) {
            return Err(DomainError::UnknownCommand(command_type.to_owned()));
        }
        serde_json::from_value(body)
            .map_err(|e| DomainError::Validation(format!("malformed command: {e}")))
    }

    /// Routes `command` to its handler, re-running it on concurrency
    /// conflicts.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnknownCommand` if no route is registered, or
    /// whatever the handler fails with once retries are exhausted.
    pub async fn dispatch(&self, command: &ProgressionCommand) -> Result<CommandOutcome, DomainError> {
        let command_type = command.command_type();
        let correlation_id = command.correlation_id();
        let route = self
            .route(command_type)
            .copied()
            .ok_or_else(|| DomainError::UnknownCommand(command_type.to_owned()))?;
        tracing::debug!(
            command_type,
            correlation_id = %correlation_id,
            touches = ?route.touches,
            "dispatching command"
        );

        let env = self.env();
        let result = retry_on_conflict(&self.retry, command_type, || (route.handler)(command, env)).await;

        match &result {
            Ok(outcome) => tracing::info!(
                command_type,
                correlation_id = %correlation_id,
                outcome = outcome.label(),
                events = outcome.events().len(),
                "command processed"
            ),
            Err(err) => tracing::error!(
                command_type,
                correlation_id = %correlation_id,
                error = %err,
                "command failed"
            ),
        }
        result
    }
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("streams", &self.streams)
            .field("retry", &self.retry)
            .field("routes", &self.command_types())
            .finish_non_exhaustive()
    }
}
