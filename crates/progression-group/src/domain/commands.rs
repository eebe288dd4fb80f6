//! Commands for the Group aggregate.
//!
//! Both commands span several streams and are carried out by the
//! coordinator's sagas.

use progression_core::command::Command;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Command to create a case as a member of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddCaseToGroup {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The group identifier.
    pub group_id: Uuid,
    /// The case identifier.
    pub case_id: Uuid,
    /// The prosecution case reference.
    pub urn: String,
    /// Defendants on the case.
    pub defendant_ids: Vec<Uuid>,
}

impl Command for AddCaseToGroup {
    fn command_type(&self) -> &'static str {
        "group.add_case_to_group"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to take a case out of its group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveCaseFromGroup {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The group identifier.
    pub group_id: Uuid,
    /// The case to remove.
    pub case_id: Uuid,
}

impl Command for RemoveCaseFromGroup {
    fn command_type(&self) -> &'static str {
        "group.remove_case_from_group"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
