//! Domain events for the Fee aggregate.

use std::fmt;

use progression_core::error::DomainError;
use progression_core::event::{DomainEvent, EventMetadata, decode_payload, encode_payload};
use progression_core::repository::StoredEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type for [`CivilFeeAdded`].
pub const CIVIL_FEE_ADDED_EVENT_TYPE: &str = "fee.civil_fee_added";
/// Event type for [`CivilFeeDuplicated`].
pub const CIVIL_FEE_DUPLICATED_EVENT_TYPE: &str = "fee.civil_fee_duplicated";
/// Event type for [`FeeStatusUpdated`].
pub const FEE_STATUS_UPDATED_EVENT_TYPE: &str = "fee.fee_status_updated";

/// The kinds of civil fee a case can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeType {
    /// Fee charged when proceedings are issued.
    InitialFee,
    /// Fee charged when a case is contested.
    ContestedFee,
}

impl FeeType {
    /// Wire name, as referenced from case state.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InitialFee => "initial_fee",
            Self::ContestedFee => "contested_fee",
        }
    }
}

impl fmt::Display for FeeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment status of a fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeStatus {
    /// Not yet paid.
    Outstanding,
    /// Paid in full.
    Paid,
    /// Waived by the court.
    Exempted,
}

/// Emitted when a civil fee is first recorded for a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CivilFeeAdded {
    /// The fee identifier.
    pub fee_id: Uuid,
    /// The owning case.
    pub case_id: Uuid,
    /// The kind of fee.
    pub fee_type: FeeType,
    /// Amount in minor units.
    pub amount: i64,
    /// Initial status.
    pub status: FeeStatus,
    /// Payment reference, if already known.
    pub payment_reference: Option<String>,
}

/// Emitted on a new fee stream when an existing fee is copied for another
/// case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CivilFeeDuplicated {
    /// Identifier of the copy.
    pub fee_id: Uuid,
    /// The case that owns the copy.
    pub case_id: Uuid,
    /// The fee the copy was taken from.
    pub duplicated_from: Uuid,
    /// The kind of fee.
    pub fee_type: FeeType,
    /// Amount in minor units.
    pub amount: i64,
    /// Status copied from the source.
    pub status: FeeStatus,
    /// Payment reference copied from the source.
    pub payment_reference: Option<String>,
}

/// Emitted when a fee's status changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeStatusUpdated {
    /// The fee identifier.
    pub fee_id: Uuid,
    /// The new status.
    pub status: FeeStatus,
    /// Payment reference recorded with the change.
    pub payment_reference: Option<String>,
}

/// Event payload variants for the Fee aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeEventKind {
    /// A civil fee has been added.
    CivilFeeAdded(CivilFeeAdded),
    /// A civil fee has been duplicated into this stream.
    CivilFeeDuplicated(CivilFeeDuplicated),
    /// The fee status has changed.
    FeeStatusUpdated(FeeStatusUpdated),
}

/// Domain event envelope for the Fee aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: FeeEventKind,
}

impl DomainEvent for FeeEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            FeeEventKind::CivilFeeAdded(_) => CIVIL_FEE_ADDED_EVENT_TYPE,
            FeeEventKind::CivilFeeDuplicated(_) => CIVIL_FEE_DUPLICATED_EVENT_TYPE,
            FeeEventKind::FeeStatusUpdated(_) => FEE_STATUS_UPDATED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> Result<serde_json::Value, DomainError> {
        encode_payload(&self.kind)
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn from_stored(stored: &StoredEvent) -> Result<Option<Self>, DomainError> {
        match stored.event_type.as_str() {
            CIVIL_FEE_ADDED_EVENT_TYPE
            | CIVIL_FEE_DUPLICATED_EVENT_TYPE
            | FEE_STATUS_UPDATED_EVENT_TYPE => Ok(Some(Self {
                metadata: EventMetadata::from_stored(stored),
                kind: decode_payload(stored)?,
            })),
            _ => Ok(None),
        }
    }
}
