mod common;

use common::{add_to_group_command, create_case_command, event_types, harness};
use progression_case::application::query_handlers::get_case_by_id;
use progression_case::domain::aggregates::ProsecutionCase;
use progression_case::domain::events::GroupMembership;
use progression_core::error::DomainError;
use progression_core::outcome::CommandOutcome;
use progression_core::rehydrate::commit;
use progression_coordinator::dispatch::ProgressionCommand;
use progression_group::application::query_handlers::get_group_by_id;
use progression_group::domain::commands::AddCaseToGroup;
use progression_test_support::Fault;
use uuid::Uuid;

#[tokio::test]
async fn test_first_case_creates_group_as_master() {
    // Arrange
    let h = harness();
    let (group, case_a) = (Uuid::new_v4(), Uuid::new_v4());

    // Act
    let outcome = h.add_to_group(group, case_a).await;

    // Assert
    assert_eq!(
        event_types(outcome.events()),
        vec!["case.case_created", "group.group_created"]
    );
    let env = h.dispatcher.env();
    let case = get_case_by_id(case_a, &env).await.unwrap();
    assert_eq!(case.group_id, Some(group));
    assert!(case.is_group_member);
    assert!(case.is_group_master);
    let view = get_group_by_id(group, &env).await.unwrap();
    assert_eq!(view.members, vec![case_a]);
    assert_eq!(view.master, Some(case_a));
}

#[tokio::test]
async fn test_second_case_joins_as_plain_member() {
    // Arrange
    let h = harness();
    let (group, case_a, case_b) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    h.add_to_group(group, case_a).await;

    // Act
    let outcome = h.add_to_group(group, case_b).await;

    // Assert
    assert_eq!(
        event_types(outcome.events()),
        vec!["case.case_created", "group.member_added"]
    );
    let env = h.dispatcher.env();
    let case = get_case_by_id(case_b, &env).await.unwrap();
    assert!(case.is_group_member);
    assert!(!case.is_group_master);
    let view = get_group_by_id(group, &env).await.unwrap();
    assert_eq!(view.members, vec![case_a, case_b]);
    assert_eq!(view.master, Some(case_a));
}

#[tokio::test]
async fn test_redelivered_add_records_case_already_exists_only() {
    // Arrange
    let h = harness();
    let (group, case_a) = (Uuid::new_v4(), Uuid::new_v4());
    h.add_to_group(group, case_a).await;

    // Act
    let outcome = h.add_to_group(group, case_a).await;

    // Assert
    assert_eq!(
        event_types(outcome.events()),
        vec!["group.case_already_exists"]
    );
    assert_eq!(h.count_of("case.case_created").await, 1);
    let view = get_group_by_id(group, &h.dispatcher.env()).await.unwrap();
    assert_eq!(view.members, vec![case_a]);
}

#[tokio::test]
async fn test_create_case_twice_is_noop() {
    let h = harness();
    let case_id = Uuid::new_v4();

    let first = h.dispatch(create_case_command(case_id)).await.unwrap();
    let second = h.dispatch(create_case_command(case_id)).await.unwrap();

    assert_eq!(event_types(first.events()), vec!["case.case_created"]);
    assert!(matches!(second, CommandOutcome::NoOp { .. }));
    assert_eq!(h.all_events().await.len(), 1);
}

#[tokio::test]
async fn test_rerun_after_group_failure_records_membership() {
    // Arrange
    let h = harness();
    let (group, case_a) = (Uuid::new_v4(), Uuid::new_v4());
    h.repo.arm(group, Fault::Unavailable);

    // Act
    let failed = h.dispatch(add_to_group_command(group, case_a)).await;
    let retried = h.add_to_group(group, case_a).await;

    // Assert
    assert!(matches!(failed, Err(DomainError::StreamUnavailable(_))));
    assert_eq!(
        event_types(retried.events()),
        vec!["group.case_already_exists", "group.group_created"]
    );
    assert_eq!(h.count_of("case.case_created").await, 1);
    let view = get_group_by_id(group, &h.dispatcher.env()).await.unwrap();
    assert_eq!(view.members, vec![case_a]);
    assert_eq!(view.master, Some(case_a));
}

#[tokio::test]
async fn test_case_that_lost_the_master_race_is_demoted() {
    // Arrange
    let h = harness();
    let (group, case_a, case_b) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    h.add_to_group(group, case_a).await;
    let env = h.dispatcher.env();
    let ctx = env.context(Uuid::new_v4());
    let mut loser = ProsecutionCase::new(case_b);
    loser
        .create(
            case_b,
            "URN-B",
            &[Uuid::new_v4()],
            Some(GroupMembership {
                group_id: group,
                is_group_master: true,
            }),
            &ctx,
        )
        .unwrap();
    commit(env.repo, &mut loser).await.unwrap();

    // Act
    let outcome = h.add_to_group(group, case_b).await;

    // Assert
    assert_eq!(
        event_types(outcome.events()),
        vec![
            "group.case_already_exists",
            "group.member_added",
            "case.group_info_updated",
        ]
    );
    let case = get_case_by_id(case_b, &env).await.unwrap();
    assert!(case.is_group_member);
    assert!(!case.is_group_master);
    let view = get_group_by_id(group, &env).await.unwrap();
    assert_eq!(view.master, Some(case_a));
}

#[tokio::test]
async fn test_blank_urn_is_a_validation_error() {
    let h = harness();
    let command = ProgressionCommand::AddCaseToGroup(AddCaseToGroup {
        correlation_id: Uuid::new_v4(),
        group_id: Uuid::new_v4(),
        case_id: Uuid::new_v4(),
        urn: "  ".into(),
        defendant_ids: vec![Uuid::new_v4()],
    });

    let result = h.dispatch(command).await;

    assert!(matches!(result, Err(DomainError::Validation(_))));
    assert!(h.all_events().await.is_empty());
}
