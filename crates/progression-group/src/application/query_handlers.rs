//! Query handlers for the Group aggregate.

use progression_core::command::HandlerEnv;
use progression_core::error::DomainError;
use progression_core::rehydrate::rehydrate;
use progression_core::stream::AggregateKind;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::Group;

/// Read-only view of a group aggregate.
#[derive(Debug, Serialize)]
pub struct GroupView {
    /// The group identifier.
    pub group_id: Uuid,
    /// Members in join order.
    pub members: Vec<Uuid>,
    /// The master case.
    pub master: Option<Uuid>,
    /// Current version (event count).
    pub version: i64,
}

/// Loads a group stream, which may still be empty.
///
/// # Errors
///
/// Returns any error raised while reading or decoding the stream.
pub async fn load_group(env: &HandlerEnv<'_>, group_id: Uuid) -> Result<Group, DomainError> {
    rehydrate(env.repo, env.stream_id(AggregateKind::Group, group_id)).await
}

/// Retrieves a group by its identifier.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the group stream is empty.
pub async fn get_group_by_id(group_id: Uuid, env: &HandlerEnv<'_>) -> Result<GroupView, DomainError> {
    let group = load_group(env, group_id).await?;
    if group.version == 0 {
        return Err(DomainError::AggregateNotFound(group_id));
    }
    Ok(GroupView {
        group_id,
        members: group.members().to_vec(),
        master: group.master(),
        version: group.version,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use progression_core::repository::{EventRepository, StoredEvent};
    use progression_core::stream::StreamRegistry;
    use progression_test_support::{FixedClock, RecordingEventRepository, SequentialIdGenerator};

    use super::*;
    use crate::domain::events::{
        GROUP_CREATED_EVENT_TYPE, GroupCreated, GroupEventKind, MEMBER_ADDED_EVENT_TYPE,
        MemberAdded,
    };

    fn stored(group_id: Uuid, sequence_number: i64, event_type: &str, kind: &GroupEventKind) -> StoredEvent {
        StoredEvent {
            event_id: Uuid::new_v4(),
            aggregate_id: group_id,
            event_type: event_type.to_owned(),
            payload: serde_json::to_value(kind).unwrap(),
            sequence_number,
            correlation_id: Uuid::new_v4(),
            causation_id: Uuid::new_v4(),
            occurred_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_get_group_by_id_returns_members_in_join_order() {
        // Arrange
        let group_id = Uuid::new_v4();
        let (case_a, case_b) = (Uuid::new_v4(), Uuid::new_v4());
        let repo = RecordingEventRepository::new();
        let events = vec![
            stored(
                group_id,
                1,
                GROUP_CREATED_EVENT_TYPE,
                &GroupEventKind::GroupCreated(GroupCreated {
                    group_id,
                    master_case_id: case_a,
                }),
            ),
            stored(
                group_id,
                2,
                MEMBER_ADDED_EVENT_TYPE,
                &GroupEventKind::MemberAdded(MemberAdded {
                    group_id,
                    case_id: case_b,
                }),
            ),
        ];
        repo.append_events(group_id, 0, &events).await.unwrap();
        let clock = FixedClock::default();
        let ids = SequentialIdGenerator::default();
        let streams = StreamRegistry::new();
        let env = HandlerEnv { repo: &repo, clock: &clock, ids: &ids, streams: &streams };

        // Act
        let view = get_group_by_id(group_id, &env).await.unwrap();

        // Assert
        assert_eq!(view.group_id, group_id);
        assert_eq!(view.members, vec![case_a, case_b]);
        assert_eq!(view.master, Some(case_a));
        assert_eq!(view.version, 2);
    }

    #[tokio::test]
    async fn test_get_group_by_id_returns_not_found_when_no_events() {
        let repo = RecordingEventRepository::new();
        let clock = FixedClock::default();
        let ids = SequentialIdGenerator::default();
        let streams = StreamRegistry::new();
        let env = HandlerEnv { repo: &repo, clock: &clock, ids: &ids, streams: &streams };
        let group_id = Uuid::new_v4();

        let result = get_group_by_id(group_id, &env).await;

        assert!(matches!(result, Err(DomainError::AggregateNotFound(id)) if id == group_id));
    }
}
