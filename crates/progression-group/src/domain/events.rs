//! Domain events for the Group aggregate.

use progression_core::error::DomainError;
use progression_core::event::{DomainEvent, EventMetadata, decode_payload, encode_payload};
use progression_core::repository::StoredEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type for [`GroupCreated`].
pub const GROUP_CREATED_EVENT_TYPE: &str = "group.group_created";
/// Event type for [`MemberAdded`].
pub const MEMBER_ADDED_EVENT_TYPE: &str = "group.member_added";
/// Event type for [`CaseAlreadyExists`].
pub const CASE_ALREADY_EXISTS_EVENT_TYPE: &str = "group.case_already_exists";
/// Event type for [`MemberRemoved`].
pub const MEMBER_REMOVED_EVENT_TYPE: &str = "group.member_removed";
/// Event type for [`MasterChanged`].
pub const MASTER_CHANGED_EVENT_TYPE: &str = "group.master_changed";
/// Event type for [`GroupUpdated`].
pub const GROUP_UPDATED_EVENT_TYPE: &str = "group.group_updated";

/// Emitted when the first case joins a group. That case is the master.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCreated {
    /// The group identifier.
    pub group_id: Uuid,
    /// The founding member, which is also the master.
    pub master_case_id: Uuid,
}

/// Emitted when a case joins an existing group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberAdded {
    /// The group identifier.
    pub group_id: Uuid,
    /// The joining case.
    pub case_id: Uuid,
}

/// Reconciliation fact: an add-to-group command arrived for a case whose
/// stream already existed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseAlreadyExists {
    /// The group identifier.
    pub group_id: Uuid,
    /// The case that already existed.
    pub case_id: Uuid,
}

/// Emitted when a case leaves a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRemoved {
    /// The group identifier.
    pub group_id: Uuid,
    /// The departing case.
    pub case_id: Uuid,
}

/// Emitted when the master designation moves to another member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterChanged {
    /// The group identifier.
    pub group_id: Uuid,
    /// The previous master.
    pub previous_master: Uuid,
    /// The new master.
    pub new_master: Uuid,
}

/// Snapshot of the group after a removal completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupUpdated {
    /// The group identifier.
    pub group_id: Uuid,
    /// Remaining members in join order.
    pub members: Vec<Uuid>,
    /// The master after the removal.
    pub master: Uuid,
    /// The case that was removed.
    pub removed_case_id: Uuid,
    /// Fee copies made for the removed case.
    pub duplicated_fee_ids: Vec<Uuid>,
}

/// Event payload variants for the Group aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupEventKind {
    /// A group has been created.
    GroupCreated(GroupCreated),
    /// A member has joined.
    MemberAdded(MemberAdded),
    /// A duplicate add was reconciled.
    CaseAlreadyExists(CaseAlreadyExists),
    /// A member has left.
    MemberRemoved(MemberRemoved),
    /// The master has changed.
    MasterChanged(MasterChanged),
    /// A removal has completed.
    GroupUpdated(GroupUpdated),
}

/// Domain event envelope for the Group aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: GroupEventKind,
}

impl DomainEvent for GroupEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            GroupEventKind::GroupCreated(_) => GROUP_CREATED_EVENT_TYPE,
            GroupEventKind::MemberAdded(_) => MEMBER_ADDED_EVENT_TYPE,
            GroupEventKind::CaseAlreadyExists(_) => CASE_ALREADY_EXISTS_EVENT_TYPE,
            GroupEventKind::MemberRemoved(_) => MEMBER_REMOVED_EVENT_TYPE,
            GroupEventKind::MasterChanged(_) => MASTER_CHANGED_EVENT_TYPE,
            GroupEventKind::GroupUpdated(_) => GROUP_UPDATED_EVENT_TYPE,
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
            GROUP_CREATED_EVENT_TYPE
            | MEMBER_ADDED_EVENT_TYPE
            | CASE_ALREADY_EXISTS_EVENT_TYPE
            | MEMBER_REMOVED_EVENT_TYPE
            | MASTER_CHANGED_EVENT_TYPE
            | GROUP_UPDATED_EVENT_TYPE => Ok(Some(Self {
                metadata: EventMetadata::from_stored(stored),
                kind: decode_payload(stored)?,
            })),
            _ => Ok(None),
        }
    }
}
