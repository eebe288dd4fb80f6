//! Creating a case as a member of a group.
//!
//! The case stream is written first, then the group stream. A redelivered
//! command finds the case stream populated and takes the "already exists"
//! branch, which only touches the group.

use progression_case::application::command_handlers::load_case;
use progression_case::domain::aggregates::ProsecutionCase;
use progression_case::domain::events::GroupMembership;
use progression_core::command::HandlerEnv;
use progression_core::error::DomainError;
use progression_core::guard::StreamPresence;
use progression_core::outcome::CommandOutcome;
use progression_core::rehydrate::commit;
use progression_core::stream::AggregateKind;
use progression_group::application::query_handlers::load_group;
use progression_group::domain::commands::AddCaseToGroup;

/// Runs the add-case-to-group saga.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a blank URN or no defendants,
/// `DomainError::ConcurrencyConflict` if another writer got in first, or
/// `DomainError::StreamUnavailable` if the store fails.
#[tracing::instrument(
    skip(command, env),
    fields(
        correlation_id = %command.correlation_id,
        group_id = %command.group_id,
        case_id = %command.case_id,
    )
)]
pub async fn add_case_to_group(
    command: &AddCaseToGroup,
    env: &HandlerEnv<'_>,
) -> Result<CommandOutcome, DomainError> {
    let ctx = env.context(command.correlation_id);
    let case_stream = env.stream_id(AggregateKind::Case, command.case_id);
    let mut group = load_group(env, command.group_id).await?;
    let mut events = Vec::new();

    match env.guard().check(case_stream).await? {
        StreamPresence::Absent => {
            let membership = GroupMembership {
                group_id: command.group_id,
                is_group_master: !group.exists(),
            };
            let mut case = ProsecutionCase::new(case_stream);
            case.create(
                command.case_id,
                &command.urn,
                &command.defendant_ids,
                Some(membership),
                &ctx,
            )?;
            events.extend(commit(env.repo, &mut case).await?);

            group.add_member(command.group_id, command.case_id, &ctx);
            events.extend(commit(env.repo, &mut group).await?);
            tracing::info!(
                is_group_master = membership.is_group_master,
                "case created in group"
            );
        }
        StreamPresence::Exists { version } => {
            let mut case = load_case(env, command.case_id).await?;
            let belongs_here = case.group_id() == Some(command.group_id);
            group.record_case_already_exists(command.group_id, command.case_id, &ctx);
            // A previous delivery created the case but stopped before the
            // group recorded it.
            if belongs_here && !group.is_member(command.case_id) {
                group.add_member(command.group_id, command.case_id, &ctx);
            }
            events.extend(commit(env.repo, &mut group).await?);

            // Two creators racing into an empty group both mark their case
            // as master; the one that lost the group append is corrected.
            let is_master = group.master() == Some(command.case_id);
            if belongs_here && case.is_group_master() != is_master {
                case.update_group_info(Some(command.group_id), true, is_master, &ctx)?;
                events.extend(commit(env.repo, &mut case).await?);
            }
            tracing::info!(case_version = version, "case already exists");
        }
    }

    Ok(CommandOutcome::Applied { events })
}
