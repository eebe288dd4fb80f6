//! Commands for the Case aggregate.

use progression_core::command::Command;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Command to create a prosecution case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCase {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The case identifier.
    pub case_id: Uuid,
    /// The prosecution case reference.
    pub urn: String,
    /// Defendants on the case.
    pub defendant_ids: Vec<Uuid>,
}

impl Command for CreateCase {
    fn command_type(&self) -> &'static str {
        "case.create_case"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to record a defendant's legal status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDefendantLegalStatus {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The case identifier.
    pub case_id: Uuid,
    /// The defendant identifier.
    pub defendant_id: Uuid,
    /// The new legal status.
    pub legal_status: String,
}

impl Command for UpdateDefendantLegalStatus {
    fn command_type(&self) -> &'static str {
        "case.update_defendant_legal_status"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to eject a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EjectCase {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The case identifier.
    pub case_id: Uuid,
    /// Why the case is being ejected.
    pub reason: String,
}

impl Command for EjectCase {
    fn command_type(&self) -> &'static str {
        "case.eject_case"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
