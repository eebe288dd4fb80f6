//! Removing a case from its group.
//!
//! The removed case leaves with its own copies of the group's civil fees,
//! and if it was the master the role passes to the earliest-joined remaining
//! member. Streams are written in this order: removed case (detach), new fee
//! streams, removed case (attach copies), new master case, group.

use std::collections::HashSet;

use progression_case::application::command_handlers::load_case;
use progression_case::domain::aggregates::ProsecutionCase;
use progression_case::domain::events::FeeReference;
use progression_core::command::{CommandContext, HandlerEnv};
use progression_core::error::DomainError;
use progression_core::guard::StreamPresence;
use progression_core::outcome::{CommandOutcome, Decision};
use progression_core::rehydrate::commit;
use progression_core::repository::StoredEvent;
use progression_core::stream::AggregateKind;
use progression_fee::application::command_handlers::load_fee;
use progression_fee::domain::aggregates::Fee;
use progression_group::application::query_handlers::load_group;
use progression_group::domain::aggregates::{Group, LAST_MEMBER_REASON, RemovalPlan};
use progression_group::domain::commands::RemoveCaseFromGroup;
use uuid::Uuid;

/// Where the saga has got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaState {
    /// The removal has been planned; nothing appended yet.
    Start,
    /// The removed case no longer records group membership.
    CaseDetached,
    /// Independent copies of the master's fees exist.
    FeesDuplicated,
    /// The removed case references its fee copies.
    CaseRecreatedWithFees,
    /// The new master case knows it is master.
    MasterReassigned,
    /// The group has recorded the removal. Terminal.
    GroupUpdated,
    /// The removal was refused. Terminal.
    Rejected,
    /// The case was not a member; nothing to do. Terminal.
    AlreadyApplied,
}

impl SagaState {
    /// Returns `true` for the states the saga stops in.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::GroupUpdated | Self::Rejected | Self::AlreadyApplied)
    }
}

struct RemoveCaseFromGroupSaga<'a> {
    command: &'a RemoveCaseFromGroup,
    env: &'a HandlerEnv<'a>,
    ctx: CommandContext<'a>,
    state: SagaState,
    group: Group,
    was_master: bool,
    previous_master: Uuid,
    new_master: Uuid,
    removed_case: ProsecutionCase,
    copies: Vec<FeeReference>,
    source_fee_types: HashSet<String>,
    reason: String,
    events: Vec<StoredEvent>,
}

/// Runs the remove-case-from-group saga.
///
/// Removing a case that is not a member is `NoOp`; removing the only member
/// is `Rejected` and appends nothing anywhere.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if a case the group refers to
/// has no stream, `DomainError::ConcurrencyConflict` if another writer got
/// in first, or `DomainError::StreamUnavailable` if the store fails. Events
/// appended before the failure stay; re-running the command completes the
/// removal.
#[tracing::instrument(
    skip(command, env),
    fields(
        correlation_id = %command.correlation_id,
        group_id = %command.group_id,
        case_id = %command.case_id,
    )
)]
pub async fn remove_case_from_group(
    command: &RemoveCaseFromGroup,
    env: &HandlerEnv<'_>,
) -> Result<CommandOutcome, DomainError> {
    let group = load_group(env, command.group_id).await?;
    let (was_master, new_master) = match group.plan_removal(command.case_id) {
        RemovalPlan::NotAMember => {
            tracing::debug!(saga_state = ?SagaState::AlreadyApplied, "case is not a member");
            return Ok(CommandOutcome::NoOp {
                reason: format!(
                    "case {} is not a member of group {}",
                    command.case_id, command.group_id
                ),
            });
        }
        RemovalPlan::LastMember => {
            tracing::warn!(saga_state = ?SagaState::Rejected, "refusing to remove last member");
            return Ok(CommandOutcome::Rejected {
                reason: LAST_MEMBER_REASON.to_owned(),
            });
        }
        RemovalPlan::Remove {
            was_master,
            new_master,
            ..
        } => (was_master, new_master),
    };
    let previous_master = group.master().unwrap_or(command.case_id);
    let removed_case = load_case(env, command.case_id).await?;

    let mut saga = RemoveCaseFromGroupSaga {
        command,
        env,
        ctx: env.context(command.correlation_id),
        state: SagaState::Start,
        group,
        was_master,
        previous_master,
        new_master,
        removed_case,
        copies: Vec::new(),
        source_fee_types: HashSet::new(),
        reason: String::new(),
        events: Vec::new(),
    };

    while !saga.state.is_terminal() {
        let next = saga.step().await?;
        tracing::debug!(saga_state = ?next, appended = saga.events.len(), "saga advanced");
        saga.state = next;
    }

    Ok(match saga.state {
        SagaState::Rejected => CommandOutcome::Rejected {
            reason: saga.reason,
        },
        SagaState::AlreadyApplied => CommandOutcome::NoOp {
            reason: saga.reason,
        },
        _ => CommandOutcome::Applied {
            events: saga.events,
        },
    })
}

/// Id of the removed case's copy of `source_fee_id`. Derived rather than
/// minted, so every attempt at the same removal targets the same fee stream.
fn copy_fee_id(source_fee_id: Uuid, removed_case_id: Uuid) -> Uuid {
    Uuid::new_v5(&source_fee_id, removed_case_id.as_bytes())
}

impl RemoveCaseFromGroupSaga<'_> {
    async fn step(&mut self) -> Result<SagaState, DomainError> {
        match self.state {
            SagaState::Start => self.detach_case().await,
            SagaState::CaseDetached => self.duplicate_fees().await,
            SagaState::FeesDuplicated => self.attach_copies().await,
            SagaState::CaseRecreatedWithFees if self.was_master => self.reassign_master().await,
            SagaState::CaseRecreatedWithFees | SagaState::MasterReassigned => {
                self.update_group().await
            }
            SagaState::GroupUpdated | SagaState::Rejected | SagaState::AlreadyApplied => {
                Ok(self.state)
            }
        }
    }

    fn reject(&mut self, reason: String) -> SagaState {
        tracing::warn!(reason = %reason, "remove case from group rejected");
        self.reason = reason;
        SagaState::Rejected
    }

    async fn detach_case(&mut self) -> Result<SagaState, DomainError> {
        let decision = self
            .removed_case
            .update_group_info(None, false, false, &self.ctx)?;
        if let Decision::Rejected(reason) = decision {
            return Ok(self.reject(reason));
        }
        self.events
            .extend(commit(self.env.repo, &mut self.removed_case).await?);
        Ok(SagaState::CaseDetached)
    }

    async fn duplicate_fees(&mut self) -> Result<SagaState, DomainError> {
        let source_fees: Vec<FeeReference> = if self.was_master {
            self.removed_case.fees().to_vec()
        } else {
            load_case(self.env, self.previous_master)
                .await?
                .fees()
                .to_vec()
        };

        for source_ref in source_fees {
            let fee_type = source_ref.fee_type;
            if !self.source_fee_types.insert(fee_type.clone()) {
                continue;
            }
            if self.removed_case.independent_fee_of_type(&fee_type).is_some() {
                tracing::debug!(fee_type = %fee_type, "removed case already holds its own fee");
                continue;
            }

            let source = load_fee(self.env, source_ref.fee_id).await?;
            if !source.exists() {
                return Err(DomainError::Validation(format!(
                    "fee {} referenced by case {} does not exist",
                    source_ref.fee_id, self.previous_master
                )));
            }
            let fee_id = copy_fee_id(source.fee_id(), self.command.case_id);
            let copy_stream = self.env.stream_id(AggregateKind::Fee, fee_id);
            if let StreamPresence::Exists { .. } = self.env.guard().check(copy_stream).await? {
                // An earlier attempt appended the copy but stopped before the
                // case recorded it.
                let existing = load_fee(self.env, fee_id).await?;
                let owned_copy = existing.details().is_some_and(|details| {
                    details.case_id == self.command.case_id
                        && details.duplicated_from == Some(source.fee_id())
                });
                if !owned_copy {
                    return Err(DomainError::Validation(format!(
                        "fee {fee_id} exists but is not a copy of fee {} for case {}",
                        source.fee_id(),
                        self.command.case_id
                    )));
                }
                tracing::debug!(fee_id = %fee_id, "reusing fee copy from an earlier attempt");
            } else {
                let mut copy = Fee::new(copy_stream);
                let decision =
                    copy.duplicate_from(fee_id, &source, self.command.case_id, &self.ctx)?;
                if let Decision::Rejected(reason) = decision {
                    return Ok(self.reject(reason));
                }
                self.events.extend(commit(self.env.repo, &mut copy).await?);
                tracing::info!(
                    source_fee_id = %source.fee_id(),
                    fee_id = %fee_id,
                    "fee duplicated for removed case"
                );
            }
            self.copies.push(FeeReference {
                fee_id,
                fee_type,
                duplicated_from: Some(source.fee_id()),
            });
        }
        Ok(SagaState::FeesDuplicated)
    }

    async fn attach_copies(&mut self) -> Result<SagaState, DomainError> {
        if self.copies.is_empty() {
            return Ok(SagaState::CaseRecreatedWithFees);
        }
        let copies = std::mem::take(&mut self.copies);
        let decision = self.removed_case.attach_duplicated_fees(copies, &self.ctx)?;
        if let Decision::Rejected(reason) = decision {
            return Ok(self.reject(reason));
        }
        self.events
            .extend(commit(self.env.repo, &mut self.removed_case).await?);
        Ok(SagaState::CaseRecreatedWithFees)
    }

    async fn reassign_master(&mut self) -> Result<SagaState, DomainError> {
        let mut new_master = load_case(self.env, self.new_master).await?;
        let decision =
            new_master.update_group_info(Some(self.command.group_id), true, true, &self.ctx)?;
        if let Decision::Rejected(reason) = decision {
            return Ok(self.reject(reason));
        }
        self.events
            .extend(commit(self.env.repo, &mut new_master).await?);
        Ok(SagaState::MasterReassigned)
    }

    async fn update_group(&mut self) -> Result<SagaState, DomainError> {
        // Read back from the case rather than from this run, so a re-run
        // after a partial failure still reports the copies.
        let duplicated_fee_ids: Vec<Uuid> = self
            .removed_case
            .fees()
            .iter()
            .filter(|fee| fee.is_independent_copy() && self.source_fee_types.contains(&fee.fee_type))
            .map(|fee| fee.fee_id)
            .collect();

        match self
            .group
            .remove_member(self.command.case_id, duplicated_fee_ids, &self.ctx)
        {
            Decision::Rejected(reason) => return Ok(self.reject(reason)),
            Decision::NoOp(reason) => {
                self.reason = reason;
                return Ok(SagaState::AlreadyApplied);
            }
            Decision::Emitted(_) => {}
        }
        self.events
            .extend(commit(self.env.repo, &mut self.group).await?);
        tracing::info!(
            new_master = %self.new_master,
            events = self.events.len(),
            "case removed from group"
        );
        Ok(SagaState::GroupUpdated)
    }
}
