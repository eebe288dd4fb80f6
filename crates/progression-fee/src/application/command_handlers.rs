//! Command handlers for the Fee aggregate.

use progression_core::command::HandlerEnv;
use progression_core::error::DomainError;
use progression_core::outcome::CommandOutcome;
use progression_core::rehydrate::{commit, rehydrate};
use progression_core::stream::AggregateKind;
use uuid::Uuid;

use crate::domain::aggregates::Fee;
use crate::domain::commands::UpdateFeeStatus;

/// Loads a fee stream, which may still be empty.
///
/// # Errors
///
/// Returns any error raised while reading or decoding the stream.
pub async fn load_fee(env: &HandlerEnv<'_>, fee_id: Uuid) -> Result<Fee, DomainError> {
    rehydrate(env.repo, env.stream_id(AggregateKind::Fee, fee_id)).await
}

/// Handles the `UpdateFeeStatus` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the fee does not exist, or a
/// storage error.
pub async fn handle_update_fee_status(
    command: &UpdateFeeStatus,
    env: &HandlerEnv<'_>,
) -> Result<CommandOutcome, DomainError> {
    let mut fee = load_fee(env, command.fee_id).await?;
    if !fee.exists() {
        return Err(DomainError::AggregateNotFound(command.fee_id));
    }

    let ctx = env.context(command.correlation_id);
    let decision = fee.update_status(command.status, command.payment_reference.clone(), &ctx)?;
    let events = commit(env.repo, &mut fee).await?;
    Ok(CommandOutcome::from_decision(decision, events))
}
