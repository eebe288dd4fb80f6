//! Adding a civil fee to a case: create the fee stream, then reference the
//! fee from the case.

use progression_case::application::command_handlers::load_case;
use progression_case::domain::events::FeeReference;
use progression_core::command::HandlerEnv;
use progression_core::error::DomainError;
use progression_core::outcome::{CommandOutcome, Decision};
use progression_core::rehydrate::commit;
use progression_core::stream::AggregateKind;
use progression_fee::application::command_handlers::load_fee;
use progression_fee::domain::aggregates::Fee;
use progression_fee::domain::commands::AddCivilFee;

/// Runs the add-civil-fee saga.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the case does not exist,
/// `DomainError::Validation` if the fee id already belongs to another case
/// or was recorded with a different fee type, or if the amount is negative,
/// or a storage error. A second fee of a type the case already carries is
/// `Rejected` before anything is appended.
#[tracing::instrument(
    skip(command, env),
    fields(
        correlation_id = %command.correlation_id,
        case_id = %command.case_id,
        fee_id = %command.fee_id,
    )
)]
pub async fn add_civil_fee(
    command: &AddCivilFee,
    env: &HandlerEnv<'_>,
) -> Result<CommandOutcome, DomainError> {
    let ctx = env.context(command.correlation_id);
    let mut case = load_case(env, command.case_id).await?;
    if case.is_ejected() {
        return Ok(CommandOutcome::Rejected {
            reason: format!("case {} has been ejected", command.case_id),
        });
    }

    let fee_stream = env.stream_id(AggregateKind::Fee, command.fee_id);
    let presence = env.guard().check(fee_stream).await?;
    if presence.exists() {
        let fee = load_fee(env, command.fee_id).await?;
        if let Some(details) = fee.details() {
            if details.case_id != command.case_id {
                return Err(DomainError::Validation(format!(
                    "fee {} belongs to case {}",
                    command.fee_id, details.case_id
                )));
            }
            if details.fee_type != command.fee_type {
                return Err(DomainError::Validation(format!(
                    "fee {} is a {} fee, not {}",
                    command.fee_id, details.fee_type, command.fee_type
                )));
            }
        }
        tracing::debug!("fee already exists, skipping creation");
    }

    // Decided before anything is appended, so a refusal leaves no fee
    // stream behind.
    let reference = FeeReference {
        fee_id: command.fee_id,
        fee_type: command.fee_type.as_str().to_owned(),
        duplicated_from: None,
    };
    let decision = case.attach_civil_fee(reference, &ctx)?;
    if let Decision::Rejected(reason) = decision {
        return Ok(CommandOutcome::Rejected { reason });
    }

    let mut events = Vec::new();
    if !presence.exists() {
        let mut fee = Fee::new(fee_stream);
        fee.add(
            command.fee_id,
            command.case_id,
            command.fee_type,
            command.amount,
            command.payment_reference.clone(),
            &ctx,
        )?;
        events.extend(commit(env.repo, &mut fee).await?);
    }
    if let Decision::NoOp(reason) = decision
        && events.is_empty()
    {
        return Ok(CommandOutcome::NoOp { reason });
    }
    events.extend(commit(env.repo, &mut case).await?);

    Ok(CommandOutcome::Applied { events })
}
