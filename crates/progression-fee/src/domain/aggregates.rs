//! Aggregate roots for the Fee aggregate.

use progression_core::aggregate::AggregateRoot;
use progression_core::command::CommandContext;
use progression_core::error::DomainError;
use progression_core::event::EventMetadata;
use progression_core::outcome::Decision;
use progression_core::stream::AggregateKind;
use uuid::Uuid;

use super::events::{
    CIVIL_FEE_ADDED_EVENT_TYPE, CIVIL_FEE_DUPLICATED_EVENT_TYPE, CivilFeeAdded,
    CivilFeeDuplicated, FEE_STATUS_UPDATED_EVENT_TYPE, FeeEvent, FeeEventKind, FeeStatus,
    FeeStatusUpdated, FeeType,
};

/// The recorded details of a fee, present once the fee stream exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeDetails {
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
}

/// The aggregate root for a civil fee.
#[derive(Debug, PartialEq)]
pub struct Fee {
    /// Aggregate (stream) identifier.
    pub id: Uuid,
    pub(crate) fee_id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    pub(crate) details: Option<FeeDetails>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<FeeEvent>,
}

impl Fee {
    /// Creates an empty fee.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            fee_id: id,
            version: 0,
            details: None,
            uncommitted_events: Vec::new(),
        }
    }

    /// The fee identifier.
    #[must_use]
    pub fn fee_id(&self) -> Uuid {
        self.fee_id
    }

    /// Returns `true` once the fee has been recorded.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.details.is_some()
    }

    /// The fee's details, if it exists.
    #[must_use]
    pub fn details(&self) -> Option<&FeeDetails> {
        self.details.as_ref()
    }

    fn stage(&mut self, ctx: &CommandContext<'_>, event_type: &str, kind: FeeEventKind) {
        let event = FeeEvent {
            metadata: EventMetadata::new(ctx, event_type, self.id, self.next_sequence_number()),
            kind,
        };
        self.uncommitted_events.push(event);
    }

    /// Records a new civil fee for `case_id`, producing a `CivilFeeAdded`
    /// event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the amount is negative.
    pub fn add(
        &mut self,
        fee_id: Uuid,
        case_id: Uuid,
        fee_type: FeeType,
        amount: i64,
        payment_reference: Option<String>,
        ctx: &CommandContext<'_>,
    ) -> Result<Decision, DomainError> {
        if self.exists() {
            return Ok(Decision::NoOp(format!("fee {} already exists", self.fee_id)));
        }
        if amount < 0 {
            return Err(DomainError::Validation(format!(
                "fee amount must not be negative, got {amount}"
            )));
        }

        self.stage(
            ctx,
            CIVIL_FEE_ADDED_EVENT_TYPE,
            FeeEventKind::CivilFeeAdded(CivilFeeAdded {
                fee_id,
                case_id,
                fee_type,
                amount,
                status: FeeStatus::Outstanding,
                payment_reference,
            }),
        );
        Ok(Decision::Emitted(1))
    }

    /// Copies `source` into this (empty) stream as fee `fee_id` owned by
    /// `new_owner`, producing a `CivilFeeDuplicated` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `source` has not been recorded.
    pub fn duplicate_from(
        &mut self,
        fee_id: Uuid,
        source: &Fee,
        new_owner: Uuid,
        ctx: &CommandContext<'_>,
    ) -> Result<Decision, DomainError> {
        let Some(original) = source.details() else {
            return Err(DomainError::Validation(format!(
                "source fee {} does not exist",
                source.fee_id
            )));
        };
        if fee_id == source.fee_id {
            return Ok(Decision::Rejected(format!(
                "duplicate of fee {fee_id} must have a new id"
            )));
        }
        if self.exists() || self.version > 0 {
            return Ok(Decision::Rejected(format!(
                "fee stream for {fee_id} already exists"
            )));
        }

        self.stage(
            ctx,
            CIVIL_FEE_DUPLICATED_EVENT_TYPE,
            FeeEventKind::CivilFeeDuplicated(CivilFeeDuplicated {
                fee_id,
                case_id: new_owner,
                duplicated_from: source.fee_id,
                fee_type: original.fee_type,
                amount: original.amount,
                status: original.status,
                payment_reference: original.payment_reference.clone(),
            }),
        );
        Ok(Decision::Emitted(1))
    }

    /// Changes the payment status, producing a `FeeStatusUpdated` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the fee does not exist.
    pub fn update_status(
        &mut self,
        status: FeeStatus,
        payment_reference: Option<String>,
        ctx: &CommandContext<'_>,
    ) -> Result<Decision, DomainError> {
        let Some(details) = &self.details else {
            return Err(DomainError::Validation(format!(
                "fee {} does not exist",
                self.fee_id
            )));
        };
        let payment_reference = payment_reference.or_else(|| details.payment_reference.clone());
        if details.status == status && details.payment_reference == payment_reference {
            return Ok(Decision::NoOp("fee status unchanged".into()));
        }

        self.stage(
            ctx,
            FEE_STATUS_UPDATED_EVENT_TYPE,
            FeeEventKind::FeeStatusUpdated(FeeStatusUpdated {
                fee_id: self.fee_id,
                status,
                payment_reference,
            }),
        );
        Ok(Decision::Emitted(1))
    }
}

impl AggregateRoot for Fee {
    type Event = FeeEvent;

    const KIND: AggregateKind = AggregateKind::Fee;

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
            FeeEventKind::CivilFeeAdded(payload) => {
                self.fee_id = payload.fee_id;
                self.details = Some(FeeDetails {
                    case_id: payload.case_id,
                    fee_type: payload.fee_type,
                    amount: payload.amount,
                    status: payload.status,
                    payment_reference: payload.payment_reference.clone(),
                    duplicated_from: None,
                });
            }
            FeeEventKind::CivilFeeDuplicated(payload) => {
                self.fee_id = payload.fee_id;
                self.details = Some(FeeDetails {
                    case_id: payload.case_id,
                    fee_type: payload.fee_type,
                    amount: payload.amount,
                    status: payload.status,
                    payment_reference: payload.payment_reference.clone(),
                    duplicated_from: Some(payload.duplicated_from),
                });
            }
            FeeEventKind::FeeStatusUpdated(payload) => {
                if let Some(details) = self.details.as_mut() {
                    details.status = payload.status;
                    details.payment_reference.clone_from(&payload.payment_reference);
                }
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

#[cfg(test)]
mod tests {
    use super::*;
    use progression_core::event::DomainEvent;
    use progression_test_support::{FixedClock, SequentialIdGenerator};

    fn settle(fee: &mut Fee) {
        for event in fee.uncommitted_events().to_vec() {
            fee.apply(&event);
        }
        let version = fee.next_sequence_number() - 1;
        fee.clear_uncommitted_events();
        fee.set_version(version);
    }

    fn recorded_fee(ctx: &CommandContext<'_>) -> Fee {
        let fee_id = Uuid::new_v4();
        let mut fee = Fee::new(fee_id);
        fee.add(
            fee_id,
            Uuid::new_v4(),
            FeeType::InitialFee,
            30_800,
            Some("PAY-1".into()),
            ctx,
        )
        .unwrap();
        settle(&mut fee);
        fee
    }

    #[test]
    fn test_add_produces_civil_fee_added_and_repeat_is_noop() {
        // Arrange
        let clock = FixedClock::default();
        let ids = SequentialIdGenerator::default();
        let ctx = CommandContext::new(Uuid::new_v4(), &clock, &ids);
        let fee_id = Uuid::new_v4();
        let case_id = Uuid::new_v4();
        let mut fee = Fee::new(fee_id);

        // Act
        let first = fee
            .add(fee_id, case_id, FeeType::InitialFee, 30_800, None, &ctx)
            .unwrap();
        assert_eq!(
            fee.uncommitted_events()[0].event_type(),
            CIVIL_FEE_ADDED_EVENT_TYPE
        );
        settle(&mut fee);
        let second = fee
            .add(fee_id, case_id, FeeType::InitialFee, 30_800, None, &ctx)
            .unwrap();

        // Assert
        assert_eq!(first, Decision::Emitted(1));
        assert!(matches!(second, Decision::NoOp(_)));
        let details = fee.details().unwrap();
        assert_eq!(details.case_id, case_id);
        assert_eq!(details.status, FeeStatus::Outstanding);
    }

    #[test]
    fn test_add_rejects_negative_amount() {
        let clock = FixedClock::default();
        let ids = SequentialIdGenerator::default();
        let ctx = CommandContext::new(Uuid::new_v4(), &clock, &ids);
        let fee_id = Uuid::new_v4();
        let mut fee = Fee::new(fee_id);

        let result = fee.add(fee_id, Uuid::new_v4(), FeeType::InitialFee, -1, None, &ctx);

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_duplicate_from_copies_state_under_new_id() {
        // Arrange
        let clock = FixedClock::default();
        let ids = SequentialIdGenerator::default();
        let ctx = CommandContext::new(Uuid::new_v4(), &clock, &ids);
        let source = recorded_fee(&ctx);
        let copy_id = Uuid::new_v4();
        let new_owner = Uuid::new_v4();
        let mut copy = Fee::new(copy_id);

        // Act
        let decision = copy.duplicate_from(copy_id, &source, new_owner, &ctx).unwrap();
        settle(&mut copy);

        // Assert
        assert_eq!(decision, Decision::Emitted(1));
        assert_ne!(copy.fee_id(), source.fee_id());
        let details = copy.details().unwrap();
        assert_eq!(details.case_id, new_owner);
        assert_eq!(details.duplicated_from, Some(source.fee_id()));
        assert_eq!(details.amount, 30_800);
        assert_eq!(details.payment_reference.as_deref(), Some("PAY-1"));
    }

    #[test]
    fn test_duplicate_from_rejects_reused_id_and_existing_stream() {
        let clock = FixedClock::default();
        let ids = SequentialIdGenerator::default();
        let ctx = CommandContext::new(Uuid::new_v4(), &clock, &ids);
        let source = recorded_fee(&ctx);
        let mut same_id = Fee::new(source.fee_id());
        let mut existing = recorded_fee(&ctx);
        let existing_id = existing.fee_id();

        let reused = same_id
            .duplicate_from(source.fee_id(), &source, Uuid::new_v4(), &ctx)
            .unwrap();
        let occupied = existing
            .duplicate_from(existing_id, &source, Uuid::new_v4(), &ctx)
            .unwrap();

        assert!(matches!(reused, Decision::Rejected(_)));
        assert!(matches!(occupied, Decision::Rejected(_)));
        assert!(same_id.uncommitted_events().is_empty());
        assert!(existing.uncommitted_events().is_empty());
    }

    #[test]
    fn test_update_status_is_noop_when_unchanged() {
        let clock = FixedClock::default();
        let ids = SequentialIdGenerator::default();
        let ctx = CommandContext::new(Uuid::new_v4(), &clock, &ids);
        let mut fee = recorded_fee(&ctx);

        let unchanged = fee.update_status(FeeStatus::Outstanding, None, &ctx).unwrap();
        let paid = fee.update_status(FeeStatus::Paid, None, &ctx).unwrap();
        settle(&mut fee);

        assert!(matches!(unchanged, Decision::NoOp(_)));
        assert_eq!(paid, Decision::Emitted(1));
        let details = fee.details().unwrap();
        assert_eq!(details.status, FeeStatus::Paid);
        assert_eq!(details.payment_reference.as_deref(), Some("PAY-1"));
    }

    #[test]
    fn test_update_status_on_missing_fee_is_validation_error() {
        let clock = FixedClock::default();
        let ids = SequentialIdGenerator::default();
        let ctx = CommandContext::new(Uuid::new_v4(), &clock, &ids);
        let mut fee = Fee::new(Uuid::new_v4());

        let result = fee.update_status(FeeStatus::Paid, None, &ctx);

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
