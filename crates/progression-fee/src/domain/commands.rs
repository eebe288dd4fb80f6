//! Commands for the Fee aggregate.

use progression_core::command::Command;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::{FeeStatus, FeeType};

/// Command to add a civil fee to a case. Touches the fee and the case
/// stream, so it is carried out by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddCivilFee {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The new fee's identifier.
    pub fee_id: Uuid,
    /// The owning case.
    pub case_id: Uuid,
    /// The kind of fee.
    pub fee_type: FeeType,
    /// Amount in minor units.
    pub amount: i64,
    /// Payment reference, if already known.
    #[serde(default)]
    pub payment_reference: Option<String>,
}

impl Command for AddCivilFee {
    fn command_type(&self) -> &'static str {
        "fee.add_civil_fee"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to change a fee's payment status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateFeeStatus {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The fee identifier.
    pub fee_id: Uuid,
    /// The new status.
    pub status: FeeStatus,
    /// Payment reference recorded with the change.
    #[serde(default)]
    pub payment_reference: Option<String>,
}

impl Command for UpdateFeeStatus {
    fn command_type(&self) -> &'static str {
        "fee.update_fee_status"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
