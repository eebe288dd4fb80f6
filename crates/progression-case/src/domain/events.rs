//! Domain events for the Case aggregate.

use progression_core::error::DomainError;
use progression_core::event::{
    DomainEvent, EventMetadata, decode_payload, encode_payload,
};
use progression_core::repository::StoredEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type for [`CaseCreated`].
pub const CASE_CREATED_EVENT_TYPE: &str = "case.case_created";
/// Event type for [`GroupInfoUpdated`].
pub const GROUP_INFO_UPDATED_EVENT_TYPE: &str = "case.group_info_updated";
/// Event type for [`CivilFeeAttached`].
pub const CIVIL_FEE_ATTACHED_EVENT_TYPE: &str = "case.civil_fee_attached";
/// Event type for [`DuplicatedFeesAttached`].
pub const DUPLICATED_FEES_ATTACHED_EVENT_TYPE: &str = "case.duplicated_fees_attached";
/// Event type for [`DefendantLegalStatusUpdated`].
pub const DEFENDANT_LEGAL_STATUS_UPDATED_EVENT_TYPE: &str =
    "case.defendant_legal_status_updated";
/// Event type for [`CaseEjected`].
pub const CASE_EJECTED_EVENT_TYPE: &str = "case.case_ejected";

/// A case's reference to a civil fee record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeReference {
    /// The fee identifier.
    pub fee_id: Uuid,
    /// The kind of fee, e.g. `initial_fee`.
    pub fee_type: String,
    /// Set when the fee was made for this case as a copy of another fee.
    pub duplicated_from: Option<Uuid>,
}

impl FeeReference {
    /// Returns `true` if this case holds its own copy of the fee rather than
    /// sharing the group master's.
    #[must_use]
    pub fn is_independent_copy(&self) -> bool {
        self.duplicated_from.is_some()
    }
}

/// Group membership recorded at creation or by a group-info update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    /// The group identifier.
    pub group_id: Uuid,
    /// Whether the case is the group's master.
    pub is_group_master: bool,
}

/// Emitted when a case is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseCreated {
    /// The case identifier.
    pub case_id: Uuid,
    /// The prosecution case reference.
    pub urn: String,
    /// Defendants on the case.
    pub defendant_ids: Vec<Uuid>,
    /// The group the case was created in, if any.
    pub group: Option<GroupMembership>,
}

/// Emitted when a case joins, leaves or is promoted within a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfoUpdated {
    /// The case identifier.
    pub case_id: Uuid,
    /// The group the case now belongs to; `None` once detached.
    pub group_id: Option<Uuid>,
    /// Whether the case is a group member.
    pub is_group_member: bool,
    /// Whether the case is the group master.
    pub is_group_master: bool,
}

/// Emitted when a civil fee is attached to a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CivilFeeAttached {
    /// The case identifier.
    pub case_id: Uuid,
    /// The attached fee.
    pub fee: FeeReference,
}

/// Emitted when independent copies of fees replace the shared group fees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicatedFeesAttached {
    /// The case identifier.
    pub case_id: Uuid,
    /// The new fees; each replaces the existing reference of its fee type.
    pub fees: Vec<FeeReference>,
}

/// Emitted when a defendant's legal status changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefendantLegalStatusUpdated {
    /// The case identifier.
    pub case_id: Uuid,
    /// The defendant identifier.
    pub defendant_id: Uuid,
    /// The new legal status, as resolved from reference data.
    pub legal_status: String,
}

/// Emitted when a case is ejected. Ejection is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseEjected {
    /// The case identifier.
    pub case_id: Uuid,
    /// Why the case was ejected.
    pub reason: String,
}

/// Event payload variants for the Case aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseEventKind {
    /// A case has been created.
    CaseCreated(CaseCreated),
    /// A case's group flags have changed.
    GroupInfoUpdated(GroupInfoUpdated),
    /// A civil fee has been attached.
    CivilFeeAttached(CivilFeeAttached),
    /// Duplicated fees have replaced shared ones.
    DuplicatedFeesAttached(DuplicatedFeesAttached),
    /// A defendant's legal status has changed.
    DefendantLegalStatusUpdated(DefendantLegalStatusUpdated),
    /// The case has been ejected.
    CaseEjected(CaseEjected),
}

/// Domain event envelope for the Case aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: CaseEventKind,
}

impl DomainEvent for CaseEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            CaseEventKind::CaseCreated(_) => CASE_CREATED_EVENT_TYPE,
            CaseEventKind::GroupInfoUpdated(_) => GROUP_INFO_UPDATED_EVENT_TYPE,
            CaseEventKind::CivilFeeAttached(_) => CIVIL_FEE_ATTACHED_EVENT_TYPE,
            CaseEventKind::DuplicatedFeesAttached(_) => DUPLICATED_FEES_ATTACHED_EVENT_TYPE,
            CaseEventKind::DefendantLegalStatusUpdated(_) => {
                DEFENDANT_LEGAL_STATUS_UPDATED_EVENT_TYPE
            }
            CaseEventKind::CaseEjected(_) => CASE_EJECTED_EVENT_TYPE,
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
            CASE_CREATED_EVENT_TYPE
            | GROUP_INFO_UPDATED_EVENT_TYPE
            | CIVIL_FEE_ATTACHED_EVENT_TYPE
            | DUPLICATED_FEES_ATTACHED_EVENT_TYPE
            | DEFENDANT_LEGAL_STATUS_UPDATED_EVENT_TYPE
            | CASE_EJECTED_EVENT_TYPE => Ok(Some(Self {
                metadata: EventMetadata::from_stored(stored),
                kind: decode_payload(stored)?,
            })),
            _ => Ok(None),
        }
    }
}
