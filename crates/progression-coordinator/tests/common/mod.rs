//! Shared harness for coordinator integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use progression_case::domain::commands::CreateCase;
use progression_core::error::DomainError;
use progression_core::outcome::CommandOutcome;
use progression_core::repository::{EventRepository, StoredEvent};
use progression_coordinator::dispatch::{CommandDispatcher, ProgressionCommand};
use progression_coordinator::retry::RetryPolicy;
use progression_fee::domain::commands::AddCivilFee;
use progression_fee::domain::events::FeeType;
use progression_group::domain::commands::{AddCaseToGroup, RemoveCaseFromGroup};
use progression_test_support::{FaultInjectingEventRepository, FixedClock, SequentialIdGenerator};
use uuid::Uuid;

/// A dispatcher wired to a fault-injecting in-memory store, a fixed clock
/// and sequential ids.
pub struct Harness {
    pub repo: Arc<FaultInjectingEventRepository>,
    pub dispatcher: CommandDispatcher,
}

pub fn harness() -> Harness {
    let repo = Arc::new(FaultInjectingEventRepository::new());
    let dispatcher = CommandDispatcher::new(
        Arc::clone(&repo) as Arc<dyn EventRepository>,
        Arc::new(FixedClock::default()),
        Arc::new(SequentialIdGenerator::default()),
    )
    .with_retry_policy(RetryPolicy::new(3, Duration::ZERO));
    Harness { repo, dispatcher }
}

impl Harness {
    pub async fn dispatch(&self, command: ProgressionCommand) -> Result<CommandOutcome, DomainError> {
        self.dispatcher.dispatch(&command).await
    }

    pub async fn add_to_group(&self, group_id: Uuid, case_id: Uuid) -> CommandOutcome {
        self.dispatch(add_to_group_command(group_id, case_id))
            .await
            .unwrap()
    }

    pub async fn add_fee(&self, case_id: Uuid, fee_id: Uuid, fee_type: FeeType) -> CommandOutcome {
        self.dispatch(ProgressionCommand::AddCivilFee(AddCivilFee {
            correlation_id: Uuid::from_u128(0xF0),
            fee_id,
            case_id,
            fee_type,
            amount: 30_800,
            payment_reference: None,
        }))
        .await
        .unwrap()
    }

    pub async fn remove(&self, group_id: Uuid, case_id: Uuid) -> Result<CommandOutcome, DomainError> {
        self.dispatch(remove_command(group_id, case_id)).await
    }

    pub async fn all_events(&self) -> Vec<StoredEvent> {
        self.repo.recorder().store().all_events().await
    }

    pub async fn count_of(&self, event_type: &str) -> usize {
        self.all_events()
            .await
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }

    pub async fn stream(&self, aggregate_id: Uuid) -> Vec<StoredEvent> {
        self.repo.load_events(aggregate_id).await.unwrap()
    }
}

pub fn create_case_command(case_id: Uuid) -> ProgressionCommand {
    ProgressionCommand::CreateCase(CreateCase {
        correlation_id: Uuid::from_u128(0xC0),
        case_id,
        urn: "28DI1234567".into(),
        defendant_ids: vec![Uuid::from_u128(0xD1)],
    })
}

pub fn add_to_group_command(group_id: Uuid, case_id: Uuid) -> ProgressionCommand {
    ProgressionCommand::AddCaseToGroup(AddCaseToGroup {
        correlation_id: Uuid::from_u128(0xA0),
        group_id,
        case_id,
        urn: format!("URN-{case_id}"),
        defendant_ids: vec![Uuid::from_u128(0xD1)],
    })
}

pub fn remove_command(group_id: Uuid, case_id: Uuid) -> ProgressionCommand {
    ProgressionCommand::RemoveCaseFromGroup(RemoveCaseFromGroup {
        correlation_id: Uuid::from_u128(0xB0),
        group_id,
        case_id,
    })
}

pub fn event_types(events: &[StoredEvent]) -> Vec<&str> {
    events.iter().map(|e| e.event_type.as_str()).collect()
}
