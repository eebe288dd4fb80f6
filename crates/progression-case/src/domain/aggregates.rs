//! Aggregate roots for the Case aggregate.

use progression_core::aggregate::AggregateRoot;
use progression_core::command::CommandContext;
use progression_core::error::DomainError;
use progression_core::event::EventMetadata;
use progression_core::outcome::Decision;
use progression_core::stream::AggregateKind;
use serde::Serialize;
use uuid::Uuid;

use super::events::{
    CASE_CREATED_EVENT_TYPE, CASE_EJECTED_EVENT_TYPE, CIVIL_FEE_ATTACHED_EVENT_TYPE,
    CaseCreated, CaseEjected, CaseEvent, CaseEventKind, CivilFeeAttached,
    DEFENDANT_LEGAL_STATUS_UPDATED_EVENT_TYPE, DUPLICATED_FEES_ATTACHED_EVENT_TYPE,
    DefendantLegalStatusUpdated, DuplicatedFeesAttached, FeeReference,
    GROUP_INFO_UPDATED_EVENT_TYPE, GroupInfoUpdated, GroupMembership,
};

/// A defendant on a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Defendant {
    /// The defendant identifier.
    pub defendant_id: Uuid,
    /// Latest legal status, if one has been recorded.
    pub legal_status: Option<String>,
}

/// The aggregate root for a prosecution case.
#[derive(Debug, PartialEq)]
pub struct ProsecutionCase {
    /// Aggregate (stream) identifier.
    pub id: Uuid,
    /// The case identifier; equals `id` unless the registry derives stream
    /// ids for cases.
    pub(crate) case_id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    pub(crate) urn: Option<String>,
    pub(crate) defendants: Vec<Defendant>,
    pub(crate) group_id: Option<Uuid>,
    pub(crate) is_group_member: bool,
    pub(crate) is_group_master: bool,
    pub(crate) fees: Vec<FeeReference>,
    pub(crate) ejected: bool,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<CaseEvent>,
}

impl ProsecutionCase {
    /// Creates an empty, not-yet-created case.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            case_id: id,
            version: 0,
            urn: None,
            defendants: Vec::new(),
            group_id: None,
            is_group_member: false,
            is_group_master: false,
            fees: Vec::new(),
            ejected: false,
            uncommitted_events: Vec::new(),
        }
    }

    /// The case identifier.
    #[must_use]
    pub fn case_id(&self) -> Uuid {
        self.case_id
    }

    /// Returns `true` once `case.case_created` has been applied.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.urn.is_some()
    }

    /// The prosecution case reference.
    #[must_use]
    pub fn urn(&self) -> Option<&str> {
        self.urn.as_deref()
    }

    /// The group the case belongs to.
    #[must_use]
    pub fn group_id(&self) -> Option<Uuid> {
        self.group_id
    }

    /// Whether the case is a group member.
    #[must_use]
    pub fn is_group_member(&self) -> bool {
        self.is_group_member
    }

    /// Whether the case is its group's master.
    #[must_use]
    pub fn is_group_master(&self) -> bool {
        self.is_group_master
    }

    /// Civil fees referenced by the case.
    #[must_use]
    pub fn fees(&self) -> &[FeeReference] {
        &self.fees
    }

    /// Defendants on the case.
    #[must_use]
    pub fn defendants(&self) -> &[Defendant] {
        &self.defendants
    }

    /// Whether the case has been ejected.
    #[must_use]
    pub fn is_ejected(&self) -> bool {
        self.ejected
    }

    /// Returns the independent (duplicated) fee of `fee_type`, if the case
    /// already holds one.
    #[must_use]
    pub fn independent_fee_of_type(&self, fee_type: &str) -> Option<&FeeReference> {
        self.fees
            .iter()
            .find(|fee| fee.fee_type == fee_type && fee.is_independent_copy())
    }

    fn stage(&mut self, ctx: &CommandContext<'_>, event_type: &str, kind: CaseEventKind) {
        let event = CaseEvent {
            metadata: EventMetadata::new(ctx, event_type, self.id, self.next_sequence_number()),
            kind,
        };
        self.uncommitted_events.push(event);
    }

    fn ensure_mutable(&self) -> Result<Option<Decision>, DomainError> {
        if !self.exists() {
            return Err(DomainError::Validation(format!(
                "case {} does not exist",
                self.case_id
            )));
        }
        if self.ejected {
            return Ok(Some(Decision::Rejected(format!(
                "case {} has been ejected",
                self.case_id
            ))));
        }
        Ok(None)
    }

    /// Creates the case, producing a `CaseCreated` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the URN is blank or there are no
    /// defendants.
    pub fn create(
        &mut self,
        case_id: Uuid,
        urn: &str,
        defendant_ids: &[Uuid],
        group: Option<GroupMembership>,
        ctx: &CommandContext<'_>,
    ) -> Result<Decision, DomainError> {
        if self.exists() {
            return Ok(Decision::NoOp(format!("case {} already exists", self.case_id)));
        }
        if urn.trim().is_empty() {
            return Err(DomainError::Validation("case URN must not be empty".into()));
        }
        if defendant_ids.is_empty() {
            return Err(DomainError::Validation(
                "a case needs at least one defendant".into(),
            ));
        }

        self.stage(
            ctx,
            CASE_CREATED_EVENT_TYPE,
            CaseEventKind::CaseCreated(CaseCreated {
                case_id,
                urn: urn.trim().to_owned(),
                defendant_ids: defendant_ids.to_vec(),
                group,
            }),
        );
        Ok(Decision::Emitted(1))
    }

    /// Records the case's group flags, producing a `GroupInfoUpdated` event.
    /// Detaching passes `None` with both flags `false`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the case does not exist or a
    /// master flag is set without membership.
    pub fn update_group_info(
        &mut self,
        group_id: Option<Uuid>,
        is_group_member: bool,
        is_group_master: bool,
        ctx: &CommandContext<'_>,
    ) -> Result<Decision, DomainError> {
        if let Some(rejection) = self.ensure_mutable()? {
            return Ok(rejection);
        }
        if is_group_master && !is_group_member {
            return Err(DomainError::Validation(
                "a group master must also be a group member".into(),
            ));
        }
        if self.group_id == group_id
            && self.is_group_member == is_group_member
            && self.is_group_master == is_group_master
        {
            return Ok(Decision::NoOp("group info unchanged".into()));
        }

        self.stage(
            ctx,
            GROUP_INFO_UPDATED_EVENT_TYPE,
            CaseEventKind::GroupInfoUpdated(GroupInfoUpdated {
                case_id: self.case_id,
                group_id,
                is_group_member,
                is_group_master,
            }),
        );
        Ok(Decision::Emitted(1))
    }

    /// Attaches a civil fee, producing a `CivilFeeAttached` event. A case
    /// carries at most one fee of each type; a second fee of a type already
    /// referenced is rejected.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the case does not exist.
    pub fn attach_civil_fee(
        &mut self,
        fee: FeeReference,
        ctx: &CommandContext<'_>,
    ) -> Result<Decision, DomainError> {
        if let Some(rejection) = self.ensure_mutable()? {
            return Ok(rejection);
        }
        if self.fees.iter().any(|f| f.fee_id == fee.fee_id) {
            return Ok(Decision::NoOp(format!(
                "fee {} already attached",
                fee.fee_id
            )));
        }
        if let Some(existing) = self.fees.iter().find(|f| f.fee_type == fee.fee_type) {
            return Ok(Decision::Rejected(format!(
                "case {} already has {} fee {}",
                self.case_id, existing.fee_type, existing.fee_id
            )));
        }

        self.stage(
            ctx,
            CIVIL_FEE_ATTACHED_EVENT_TYPE,
            CaseEventKind::CivilFeeAttached(CivilFeeAttached {
                case_id: self.case_id,
                fee,
            }),
        );
        Ok(Decision::Emitted(1))
    }

    /// Attaches independent fee copies, producing a `DuplicatedFeesAttached`
    /// event. Fee types for which the case already holds an independent copy
    /// are skipped, which makes a replayed saga step harmless.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the case does not exist or a fee
    /// is not marked as a copy.
    pub fn attach_duplicated_fees(
        &mut self,
        fees: Vec<FeeReference>,
        ctx: &CommandContext<'_>,
    ) -> Result<Decision, DomainError> {
        if let Some(rejection) = self.ensure_mutable()? {
            return Ok(rejection);
        }
        if let Some(fee) = fees.iter().find(|f| !f.is_independent_copy()) {
            return Err(DomainError::Validation(format!(
                "fee {} is not a duplicated fee",
                fee.fee_id
            )));
        }

        let fees: Vec<FeeReference> = fees
            .into_iter()
            .filter(|f| self.independent_fee_of_type(&f.fee_type).is_none())
            .collect();
        if fees.is_empty() {
            return Ok(Decision::NoOp("duplicated fees already attached".into()));
        }

        self.stage(
            ctx,
            DUPLICATED_FEES_ATTACHED_EVENT_TYPE,
            CaseEventKind::DuplicatedFeesAttached(DuplicatedFeesAttached {
                case_id: self.case_id,
                fees,
            }),
        );
        Ok(Decision::Emitted(1))
    }

    /// Records a defendant's legal status, producing a
    /// `DefendantLegalStatusUpdated` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the case does not exist, the
    /// defendant is not on the case or the status is blank.
    pub fn update_defendant_legal_status(
        &mut self,
        defendant_id: Uuid,
        legal_status: &str,
        ctx: &CommandContext<'_>,
    ) -> Result<Decision, DomainError> {
        if let Some(rejection) = self.ensure_mutable()? {
            return Ok(rejection);
        }
        if legal_status.trim().is_empty() {
            return Err(DomainError::Validation(
                "legal status must not be empty".into(),
            ));
        }
        let Some(defendant) = self
            .defendants
            .iter()
            .find(|d| d.defendant_id == defendant_id)
        else {
            return Err(DomainError::Validation(format!(
                "defendant {defendant_id} not found in case {}",
                self.case_id
            )));
        };
        if defendant.legal_status.as_deref() == Some(legal_status) {
            return Ok(Decision::NoOp("legal status unchanged".into()));
        }

        self.stage(
            ctx,
            DEFENDANT_LEGAL_STATUS_UPDATED_EVENT_TYPE,
            CaseEventKind::DefendantLegalStatusUpdated(DefendantLegalStatusUpdated {
                case_id: self.case_id,
                defendant_id,
                legal_status: legal_status.to_owned(),
            }),
        );
        Ok(Decision::Emitted(1))
    }

    /// Ejects the case, producing a `CaseEjected` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the case does not exist.
    pub fn eject(&mut self, reason: &str, ctx: &CommandContext<'_>) -> Result<Decision, DomainError> {
        if !self.exists() {
            return Err(DomainError::Validation(format!(
                "case {} does not exist",
                self.case_id
            )));
        }
        if self.ejected {
            return Ok(Decision::NoOp(format!("case {} already ejected", self.case_id)));
        }

        self.stage(
            ctx,
            CASE_EJECTED_EVENT_TYPE,
            CaseEventKind::CaseEjected(CaseEjected {
                case_id: self.case_id,
                reason: reason.to_owned(),
            }),
        );
        Ok(Decision::Emitted(1))
    }
}

impl AggregateRoot for ProsecutionCase {
    type Event = CaseEvent;

    const KIND: AggregateKind = AggregateKind::Case;

    fn initial(id: Uuid) -> Self {
        Self::new(id)
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            CaseEventKind::CaseCreated(payload) => {
                self.case_id = payload.case_id;
                self.urn = Some(payload.urn.clone());
                self.defendants = payload
                    .defendant_ids
                    .iter()
                    .map(|&defendant_id| Defendant {
                        defendant_id,
                        legal_status: None,
                    })
                    .collect();
                if let Some(group) = payload.group {
                    self.group_id = Some(group.group_id);
                    self.is_group_member = true;
                    self.is_group_master = group.is_group_master;
                }
            }
            CaseEventKind::GroupInfoUpdated(payload) => {
                self.group_id = payload.group_id;
                self.is_group_member = payload.is_group_member;
                self.is_group_master = payload.is_group_master;
            }
            CaseEventKind::CivilFeeAttached(payload) => {
                self.fees.push(payload.fee.clone());
            }
            CaseEventKind::DuplicatedFeesAttached(payload) => {
                for fee in &payload.fees {
                    self.fees.retain(|existing| existing.fee_type != fee.fee_type);
                    self.fees.push(fee.clone());
                }
            }
            CaseEventKind::DefendantLegalStatusUpdated(payload) => {
                if let Some(defendant) = self
                    .defendants
                    .iter_mut()
                    .find(|d| d.defendant_id == payload.defendant_id)
                {
                    defendant.legal_status = Some(payload.legal_status.clone());
                }
            }
            CaseEventKind::CaseEjected(_) => {
                self.ejected = true;
            }
        }
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}
