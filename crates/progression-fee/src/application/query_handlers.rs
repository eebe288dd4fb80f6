//! Query handlers for the Fee aggregate.

use progression_core::command::HandlerEnv;
use progression_core::error::DomainError;
use serde::Serialize;
use uuid::Uuid;

use crate::application::command_handlers::load_fee;
use crate::domain::events::{FeeStatus, FeeType};

/// Read-only view of a fee aggregate.
#[derive(Debug, Serialize)]
pub struct FeeView {
    /// The fee identifier.
    pub fee_id: Uuid,
    /// The owning case.
    pub case_id: Uuid,
    /// The kind of fee.
    pub fee_type: FeeType,
    /// Amount in minor units.
    pub amount: i64,
    /// Payment status.
    pub status: FeeStatus,
    /// Payment reference.
    pub payment_reference: Option<String>,
    /// The fee this one was copied from.
    pub duplicated_from: Option<Uuid>,
    /// Current version (event count).
    pub version: i64,
}

/// Retrieves a fee by its identifier.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the fee stream is empty.
pub async fn get_fee_by_id(fee_id: Uuid, env: &HandlerEnv<'_>) -> Result<FeeView, DomainError> {
    let fee = load_fee(env, fee_id).await?;
    let Some(details) = fee.details() else {
        return Err(DomainError::AggregateNotFound(fee_id));
    };
    Ok(FeeView {
        fee_id,
        case_id: details.case_id,
        fee_type: details.fee_type,
        amount: details.amount,
        status: details.status,
        payment_reference: details.payment_reference.clone(),
        duplicated_from: details.duplicated_from,
        version: fee.version,
    })
}
