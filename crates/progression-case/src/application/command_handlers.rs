//! Command handlers for the Case aggregate.
//!
//! Each handler loads the case stream, asks the aggregate to decide, and
//! persists whatever the decision staged in a single append.

use progression_core::command::HandlerEnv;
use progression_core::error::DomainError;
use progression_core::guard::StreamPresence;
use progression_core::outcome::CommandOutcome;
use progression_core::rehydrate::{commit, rehydrate};
use progression_core::stream::AggregateKind;
use uuid::Uuid;

use crate::domain::aggregates::ProsecutionCase;
use crate::domain::commands::{CreateCase, EjectCase, UpdateDefendantLegalStatus};

/// Loads an existing case.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the case stream is empty, or
/// any error raised while reading the stream.
pub async fn load_case(env: &HandlerEnv<'_>, case_id: Uuid) -> Result<ProsecutionCase, DomainError> {
    let stream_id = env.stream_id(AggregateKind::Case, case_id);
    let case: ProsecutionCase = rehydrate(env.repo, stream_id).await?;
    if case.exists() {
        Ok(case)
    } else {
        Err(DomainError::AggregateNotFound(case_id))
    }
}

/// Handles the `CreateCase` command. A redelivered command finds the stream
/// already populated and yields `NoOp`.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a blank URN or no defendants, or a
/// storage error from the event store.
pub async fn handle_create_case(
    command: &CreateCase,
    env: &HandlerEnv<'_>,
) -> Result<CommandOutcome, DomainError> {
    let stream_id = env.stream_id(AggregateKind::Case, command.case_id);
    if let StreamPresence::Exists { version } = env.guard().check(stream_id).await? {
        return Ok(CommandOutcome::NoOp {
            reason: format!(
                "case {} already exists at version {version}",
                command.case_id
            ),
        });
    }

    let ctx = env.context(command.correlation_id);
    let mut case = ProsecutionCase::new(stream_id);
    let decision = case.create(
        command.case_id,
        &command.urn,
        &command.defendant_ids,
        None,
        &ctx,
    )?;
    let events = commit(env.repo, &mut case).await?;
    Ok(CommandOutcome::from_decision(decision, events))
}

/// Handles the `UpdateDefendantLegalStatus` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the case does not exist,
/// `DomainError::Validation` for an unknown defendant, or a storage error.
pub async fn handle_update_defendant_legal_status(
    command: &UpdateDefendantLegalStatus,
    env: &HandlerEnv<'_>,
) -> Result<CommandOutcome, DomainError> {
    let mut case = load_case(env, command.case_id).await?;
    let ctx = env.context(command.correlation_id);
    let decision = case.update_defendant_legal_status(
        command.defendant_id,
        &command.legal_status,
        &ctx,
    )?;
    let events = commit(env.repo, &mut case).await?;
    Ok(CommandOutcome::from_decision(decision, events))
}

/// Handles the `EjectCase` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the case does not exist, or a
/// storage error.
pub async fn handle_eject_case(
    command: &EjectCase,
    env: &HandlerEnv<'_>,
) -> Result<CommandOutcome, DomainError> {
    let mut case = load_case(env, command.case_id).await?;
    let ctx = env.context(command.correlation_id);
    let decision = case.eject(&command.reason, &ctx)?;
    let events = commit(env.repo, &mut case).await?;
    Ok(CommandOutcome::from_decision(decision, events))
}

#[cfg(test)]
mod tests {
    use progression_core::stream::{StreamIdRule, StreamRegistry};
    use progression_test_support::{
        FailingEventRepository, FixedClock, RecordingEventRepository, SequentialIdGenerator,
    };

    use super::*;
    use crate::domain::events::{
        CASE_CREATED_EVENT_TYPE, CASE_EJECTED_EVENT_TYPE,
        DEFENDANT_LEGAL_STATUS_UPDATED_EVENT_TYPE,
    };

    fn create_command(case_id: Uuid, defendant_id: Uuid) -> CreateCase {
        CreateCase {
            correlation_id: Uuid::new_v4(),
            case_id,
            urn: "28DI1234567".into(),
            defendant_ids: vec![defendant_id],
        }
    }

    #[tokio::test]
    async fn test_handle_create_case_appends_case_created() {
        // Arrange
        let repo = RecordingEventRepository::new();
        let clock = FixedClock::default();
        let ids = SequentialIdGenerator::default();
        let streams = StreamRegistry::new();
        let env = HandlerEnv { repo: &repo, clock: &clock, ids: &ids, streams: &streams };
        let case_id = Uuid::new_v4();

        // Act
        let outcome = handle_create_case(&create_command(case_id, Uuid::new_v4()), &env)
            .await
            .unwrap();

        // Assert
        assert_eq!(outcome.label(), "applied");
        let appended = repo.appended();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].aggregate_id, case_id);
        assert_eq!(appended[0].expected_version, 0);
        assert_eq!(appended[0].events[0].event_type, CASE_CREATED_EVENT_TYPE);
        assert_eq!(appended[0].events[0].sequence_number, 1);
        assert_eq!(outcome.events(), appended[0].events.as_slice());
    }

    #[tokio::test]
    async fn test_handle_create_case_twice_is_noop_with_one_event() {
        // Arrange
        let repo = RecordingEventRepository::new();
        let clock = FixedClock::default();
        let ids = SequentialIdGenerator::default();
        let streams = StreamRegistry::new();
        let env = HandlerEnv { repo: &repo, clock: &clock, ids: &ids, streams: &streams };
        let command = create_command(Uuid::new_v4(), Uuid::new_v4());
        handle_create_case(&command, &env).await.unwrap();

        // Act
        let outcome = handle_create_case(&command, &env).await.unwrap();

        // Assert
        assert!(matches!(outcome, CommandOutcome::NoOp { .. }));
        assert_eq!(repo.store().total_events().await, 1);
    }

    #[tokio::test]
    async fn test_handle_create_case_uses_derived_stream_id() {
        // Arrange
        let repo = RecordingEventRepository::new();
        let clock = FixedClock::default();
        let ids = SequentialIdGenerator::default();
        let streams = StreamRegistry::new().with_rule(
            AggregateKind::Case,
            StreamIdRule::NameBased { namespace: Uuid::from_u128(0xCA5E) },
        );
        let env = HandlerEnv { repo: &repo, clock: &clock, ids: &ids, streams: &streams };
        let case_id = Uuid::new_v4();

        // Act
        handle_create_case(&create_command(case_id, Uuid::new_v4()), &env)
            .await
            .unwrap();
        let case = load_case(&env, case_id).await.unwrap();

        // Assert
        let stream_id = streams.stream_id(AggregateKind::Case, case_id);
        assert_ne!(stream_id, case_id);
        assert_eq!(repo.appended()[0].aggregate_id, stream_id);
        assert_eq!(case.case_id(), case_id);
        assert_eq!(case.id, stream_id);
    }

    #[tokio::test]
    async fn test_handle_update_defendant_legal_status_appends_event() {
        // Arrange
        let repo = RecordingEventRepository::new();
        let clock = FixedClock::default();
        let ids = SequentialIdGenerator::default();
        let streams = StreamRegistry::new();
        let env = HandlerEnv { repo: &repo, clock: &clock, ids: &ids, streams: &streams };
        let case_id = Uuid::new_v4();
        let defendant_id = Uuid::new_v4();
        handle_create_case(&create_command(case_id, defendant_id), &env)
            .await
            .unwrap();
        let command = UpdateDefendantLegalStatus {
            correlation_id: Uuid::new_v4(),
            case_id,
            defendant_id,
            legal_status: "legal_aid_granted".into(),
        };

        // Act
        let outcome = handle_update_defendant_legal_status(&command, &env)
            .await
            .unwrap();
        let repeat = handle_update_defendant_legal_status(&command, &env)
            .await
            .unwrap();

        // Assert
        assert_eq!(
            outcome.events()[0].event_type,
            DEFENDANT_LEGAL_STATUS_UPDATED_EVENT_TYPE
        );
        assert_eq!(outcome.events()[0].sequence_number, 2);
        assert!(matches!(repeat, CommandOutcome::NoOp { .. }));
        let case = load_case(&env, case_id).await.unwrap();
        assert_eq!(
            case.defendants()[0].legal_status.as_deref(),
            Some("legal_aid_granted")
        );
    }

    #[tokio::test]
    async fn test_handle_eject_case_returns_not_found_for_missing_case() {
        // Arrange
        let repo = RecordingEventRepository::new();
        let clock = FixedClock::default();
        let ids = SequentialIdGenerator::default();
        let streams = StreamRegistry::new();
        let env = HandlerEnv { repo: &repo, clock: &clock, ids: &ids, streams: &streams };
        let case_id = Uuid::new_v4();
        let command = EjectCase {
            correlation_id: Uuid::new_v4(),
            case_id,
            reason: "listed in error".into(),
        };

        // Act
        let result = handle_eject_case(&command, &env).await;

        // Assert
        match result {
            Err(DomainError::AggregateNotFound(id)) => assert_eq!(id, case_id),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
        assert!(repo.appended().is_empty());
    }

    #[tokio::test]
    async fn test_handle_eject_case_appends_case_ejected() {
        let repo = RecordingEventRepository::new();
        let clock = FixedClock::default();
        let ids = SequentialIdGenerator::default();
        let streams = StreamRegistry::new();
        let env = HandlerEnv { repo: &repo, clock: &clock, ids: &ids, streams: &streams };
        let case_id = Uuid::new_v4();
        handle_create_case(&create_command(case_id, Uuid::new_v4()), &env)
            .await
            .unwrap();

        let outcome = handle_eject_case(
            &EjectCase {
                correlation_id: Uuid::new_v4(),
                case_id,
                reason: "listed in error".into(),
            },
            &env,
        )
        .await
        .unwrap();

        assert_eq!(outcome.events()[0].event_type, CASE_EJECTED_EVENT_TYPE);
        assert!(load_case(&env, case_id).await.unwrap().is_ejected());
    }

    #[tokio::test]
    async fn test_handle_create_case_propagates_stream_unavailable() {
        let repo = FailingEventRepository;
        let clock = FixedClock::default();
        let ids = SequentialIdGenerator::default();
        let streams = StreamRegistry::new();
        let env = HandlerEnv { repo: &repo, clock: &clock, ids: &ids, streams: &streams };

        let result = handle_create_case(&create_command(Uuid::new_v4(), Uuid::new_v4()), &env).await;

        assert!(matches!(result, Err(DomainError::StreamUnavailable(_))));
    }
}
