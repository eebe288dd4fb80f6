//! Aggregate roots for the Group aggregate.

use progression_core::aggregate::AggregateRoot;
use progression_core::command::CommandContext;
use progression_core::event::EventMetadata;
use progression_core::outcome::Decision;
use progression_core::stream::AggregateKind;
use uuid::Uuid;

use super::events::{
    CASE_ALREADY_EXISTS_EVENT_TYPE, CaseAlreadyExists, GROUP_CREATED_EVENT_TYPE,
    GROUP_UPDATED_EVENT_TYPE, GroupCreated, GroupEvent, GroupEventKind, GroupUpdated,
    MASTER_CHANGED_EVENT_TYPE, MEMBER_ADDED_EVENT_TYPE, MEMBER_REMOVED_EVENT_TYPE, MasterChanged,
    MemberAdded, MemberRemoved,
};

/// Reason given when a removal would empty the group.
pub const LAST_MEMBER_REASON: &str = "cannot remove last member";

/// What removing a case from the group would do, worked out without staging
/// anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalPlan {
    /// The case is not (or no longer) a member.
    NotAMember,
    /// The case is the only member; the group must keep at least one.
    LastMember,
    /// The case can be removed.
    Remove {
        /// Whether the case is the current master.
        was_master: bool,
        /// The master once the case has gone.
        new_master: Uuid,
        /// Members left behind, in join order.
        remaining: Vec<Uuid>,
    },
}

/// The aggregate root for a case group.
#[derive(Debug, PartialEq)]
pub struct Group {
    /// Aggregate (stream) identifier.
    pub id: Uuid,
    pub(crate) group_id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    /// Members in join order.
    pub(crate) members: Vec<Uuid>,
    pub(crate) master: Option<Uuid>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<GroupEvent>,
}

impl Group {
    /// Creates an empty group.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            group_id: id,
            version: 0,
            members: Vec::new(),
            master: None,
            uncommitted_events: Vec::new(),
        }
    }

    /// The group identifier.
    #[must_use]
    pub fn group_id(&self) -> Uuid {
        self.group_id
    }

    /// Returns `true` once the group has been created.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.master.is_some()
    }

    /// Members in join order.
    #[must_use]
    pub fn members(&self) -> &[Uuid] {
        &self.members
    }

    /// The master case.
    #[must_use]
    pub fn master(&self) -> Option<Uuid> {
        self.master
    }

    /// Whether `case_id` is a member.
    #[must_use]
    pub fn is_member(&self, case_id: Uuid) -> bool {
        self.members.contains(&case_id)
    }

    /// A member may only leave while another member stays behind.
    #[must_use]
    pub fn can_be_removed(&self) -> bool {
        self.members.len() >= 2
    }

    fn stage(&mut self, ctx: &CommandContext<'_>, event_type: &str, kind: GroupEventKind) {
        let event = GroupEvent {
            metadata: EventMetadata::new(ctx, event_type, self.id, self.next_sequence_number()),
            kind,
        };
        self.uncommitted_events.push(event);
    }

    /// Adds a case. The first member creates the group and becomes master.
    pub fn add_member(
        &mut self,
        group_id: Uuid,
        case_id: Uuid,
        ctx: &CommandContext<'_>,
    ) -> Decision {
        if self.is_member(case_id) {
            return Decision::NoOp(format!(
                "case {case_id} is already a member of group {}",
                self.group_id
            ));
        }

        if self.exists() {
            self.stage(
                ctx,
                MEMBER_ADDED_EVENT_TYPE,
                GroupEventKind::MemberAdded(MemberAdded {
                    group_id: self.group_id,
                    case_id,
                }),
            );
        } else {
            self.stage(
                ctx,
                GROUP_CREATED_EVENT_TYPE,
                GroupEventKind::GroupCreated(GroupCreated {
                    group_id,
                    master_case_id: case_id,
                }),
            );
        }
        Decision::Emitted(1)
    }

    /// Records that an add-to-group command found the case already created.
    pub fn record_case_already_exists(
        &mut self,
        group_id: Uuid,
        case_id: Uuid,
        ctx: &CommandContext<'_>,
    ) -> Decision {
        self.stage(
            ctx,
            CASE_ALREADY_EXISTS_EVENT_TYPE,
            GroupEventKind::CaseAlreadyExists(CaseAlreadyExists { group_id, case_id }),
        );
        Decision::Emitted(1)
    }

    /// Works out what removing `case_id` would do.
    #[must_use]
    pub fn plan_removal(&self, case_id: Uuid) -> RemovalPlan {
        if !self.is_member(case_id) {
            return RemovalPlan::NotAMember;
        }
        if !self.can_be_removed() {
            return RemovalPlan::LastMember;
        }

        let remaining: Vec<Uuid> = self
            .members
            .iter()
            .copied()
            .filter(|&member| member != case_id)
            .collect();
        let was_master = self.master == Some(case_id);
        // Earliest-joined remaining member takes over.
        let new_master = match self.master {
            Some(master) if !was_master => master,
            _ => remaining[0],
        };
        RemovalPlan::Remove {
            was_master,
            new_master,
            remaining,
        }
    }

    /// Removes a member, handing the master role on if needed, and records
    /// the resulting group snapshot together with the fee ids duplicated for
    /// the departing case.
    pub fn remove_member(
        &mut self,
        case_id: Uuid,
        duplicated_fee_ids: Vec<Uuid>,
        ctx: &CommandContext<'_>,
    ) -> Decision {
        let (was_master, new_master, remaining) = match self.plan_removal(case_id) {
            RemovalPlan::NotAMember => {
                return Decision::NoOp(format!(
                    "case {case_id} is not a member of group {}",
                    self.group_id
                ));
            }
            RemovalPlan::LastMember => return Decision::Rejected(LAST_MEMBER_REASON.to_owned()),
            RemovalPlan::Remove {
                was_master,
                new_master,
                remaining,
            } => (was_master, new_master, remaining),
        };

        let group_id = self.group_id;
        self.stage(
            ctx,
            MEMBER_REMOVED_EVENT_TYPE,
            GroupEventKind::MemberRemoved(MemberRemoved { group_id, case_id }),
        );
        let mut emitted = 1;
        if was_master {
            self.stage(
                ctx,
                MASTER_CHANGED_EVENT_TYPE,
                GroupEventKind::MasterChanged(MasterChanged {
                    group_id,
                    previous_master: case_id,
                    new_master,
                }),
            );
            emitted += 1;
        }
        self.stage(
            ctx,
            GROUP_UPDATED_EVENT_TYPE,
            GroupEventKind::GroupUpdated(GroupUpdated {
                group_id,
                members: remaining,
                master: new_master,
                removed_case_id: case_id,
                duplicated_fee_ids,
            }),
        );
        Decision::Emitted(emitted + 1)
    }
}

impl AggregateRoot for Group {
    type Event = GroupEvent;

    const KIND: AggregateKind = AggregateKind::Group;

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
            GroupEventKind::GroupCreated(payload) => {
                self.group_id = payload.group_id;
                self.members = vec![payload.master_case_id];
                self.master = Some(payload.master_case_id);
            }
            GroupEventKind::MemberAdded(payload) => {
                if !self.members.contains(&payload.case_id) {
                    self.members.push(payload.case_id);
                }
            }
            GroupEventKind::CaseAlreadyExists(_) => {}
            GroupEventKind::MemberRemoved(payload) => {
                self.members.retain(|&member| member != payload.case_id);
            }
            GroupEventKind::MasterChanged(payload) => {
                self.master = Some(payload.new_master);
            }
            GroupEventKind::GroupUpdated(payload) => {
                self.members.clone_from(&payload.members);
                self.master = Some(payload.master);
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

    fn settle(group: &mut Group) {
        for event in group.uncommitted_events().to_vec() {
            group.apply(&event);
        }
        let version = group.next_sequence_number() - 1;
        group.clear_uncommitted_events();
        group.set_version(version);
    }

    fn group_with(members: &[Uuid], ctx: &CommandContext<'_>) -> Group {
        let group_id = Uuid::new_v4();
        let mut group = Group::new(group_id);
        for &member in members {
            group.add_member(group_id, member, ctx);
            settle(&mut group);
        }
        group
    }

    #[test]
    fn test_first_member_creates_group_as_master() {
        // Arrange
        let clock = FixedClock::default();
        let ids = SequentialIdGenerator::default();
        let ctx = CommandContext::new(Uuid::new_v4(), &clock, &ids);
        let group_id = Uuid::new_v4();
        let case_a = Uuid::new_v4();
        let mut group = Group::new(group_id);

        // Act
        let decision = group.add_member(group_id, case_a, &ctx);

        // Assert
        assert_eq!(decision, Decision::Emitted(1));
        assert_eq!(
            group.uncommitted_events()[0].event_type(),
            GROUP_CREATED_EVENT_TYPE
        );
        settle(&mut group);
        assert_eq!(group.members(), &[case_a]);
        assert_eq!(group.master(), Some(case_a));
    }

    #[test]
    fn test_second_member_is_added_and_duplicate_is_noop() {
        let clock = FixedClock::default();
        let ids = SequentialIdGenerator::default();
        let ctx = CommandContext::new(Uuid::new_v4(), &clock, &ids);
        let (case_a, case_b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut group = group_with(&[case_a], &ctx);

        let added = group.add_member(group.group_id(), case_b, &ctx);
        assert_eq!(
            group.uncommitted_events()[0].event_type(),
            MEMBER_ADDED_EVENT_TYPE
        );
        settle(&mut group);
        let again = group.add_member(group.group_id(), case_b, &ctx);

        assert_eq!(added, Decision::Emitted(1));
        assert!(matches!(again, Decision::NoOp(_)));
        assert_eq!(group.members(), &[case_a, case_b]);
        assert_eq!(group.master(), Some(case_a));
    }

    #[test]
    fn test_plan_removal_of_sole_member_is_last_member() {
        let clock = FixedClock::default();
        let ids = SequentialIdGenerator::default();
        let ctx = CommandContext::new(Uuid::new_v4(), &clock, &ids);
        let case_a = Uuid::new_v4();
        let group = group_with(&[case_a], &ctx);

        assert!(!group.can_be_removed());
        assert_eq!(group.plan_removal(case_a), RemovalPlan::LastMember);
        assert_eq!(group.plan_removal(Uuid::new_v4()), RemovalPlan::NotAMember);
    }

    #[test]
    fn test_plan_removal_of_master_picks_earliest_joined_remaining_member() {
        let clock = FixedClock::default();
        let ids = SequentialIdGenerator::default();
        let ctx = CommandContext::new(Uuid::new_v4(), &clock, &ids);
        let (case_a, case_b, case_c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let group = group_with(&[case_a, case_b, case_c], &ctx);

        let plan = group.plan_removal(case_a);

        assert_eq!(
            plan,
            RemovalPlan::Remove {
                was_master: true,
                new_master: case_b,
                remaining: vec![case_b, case_c],
            }
        );
    }

    #[test]
    fn test_plan_removal_of_non_master_keeps_master() {
        let clock = FixedClock::default();
        let ids = SequentialIdGenerator::default();
        let ctx = CommandContext::new(Uuid::new_v4(), &clock, &ids);
        let (case_a, case_b, case_c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let group = group_with(&[case_a, case_b, case_c], &ctx);

        let plan = group.plan_removal(case_b);

        assert_eq!(
            plan,
            RemovalPlan::Remove {
                was_master: false,
                new_master: case_a,
                remaining: vec![case_a, case_c],
            }
        );
    }

    #[test]
    fn test_remove_master_emits_removed_master_changed_and_updated() {
        // Arrange
        let clock = FixedClock::default();
        let ids = SequentialIdGenerator::default();
        let ctx = CommandContext::new(Uuid::new_v4(), &clock, &ids);
        let (case_a, case_b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut group = group_with(&[case_a, case_b], &ctx);
        let fee_copy = Uuid::new_v4();

        // Act
        let decision = group.remove_member(case_a, vec![fee_copy], &ctx);

        // Assert
        assert_eq!(decision, Decision::Emitted(3));
        let types: Vec<&str> = group
            .uncommitted_events()
            .iter()
            .map(DomainEvent::event_type)
            .collect();
        assert_eq!(
            types,
            vec![
                MEMBER_REMOVED_EVENT_TYPE,
                MASTER_CHANGED_EVENT_TYPE,
                GROUP_UPDATED_EVENT_TYPE
            ]
        );
        let sequence_numbers: Vec<i64> = group
            .uncommitted_events()
            .iter()
            .map(|e| e.metadata().sequence_number)
            .collect();
        assert_eq!(sequence_numbers, vec![3, 4, 5]);
        match &group.uncommitted_events()[2].kind {
            GroupEventKind::GroupUpdated(payload) => {
                assert_eq!(payload.members, vec![case_b]);
                assert_eq!(payload.master, case_b);
                assert_eq!(payload.removed_case_id, case_a);
                assert_eq!(payload.duplicated_fee_ids, vec![fee_copy]);
            }
            other => panic!("expected GroupUpdated, got {other:?}"),
        }
        settle(&mut group);
        assert_eq!(group.members(), &[case_b]);
        assert_eq!(group.master(), Some(case_b));
    }

    #[test]
    fn test_remove_last_member_is_rejected_without_events() {
        let clock = FixedClock::default();
        let ids = SequentialIdGenerator::default();
        let ctx = CommandContext::new(Uuid::new_v4(), &clock, &ids);
        let case_a = Uuid::new_v4();
        let mut group = group_with(&[case_a], &ctx);

        let decision = group.remove_member(case_a, Vec::new(), &ctx);

        assert_eq!(decision, Decision::Rejected(LAST_MEMBER_REASON.to_owned()));
        assert!(group.uncommitted_events().is_empty());
    }

    #[test]
    fn test_remove_non_member_is_noop() {
        let clock = FixedClock::default();
        let ids = SequentialIdGenerator::default();
        let ctx = CommandContext::new(Uuid::new_v4(), &clock, &ids);
        let mut group = group_with(&[Uuid::new_v4(), Uuid::new_v4()], &ctx);

        let decision = group.remove_member(Uuid::new_v4(), Vec::new(), &ctx);

        assert!(matches!(decision, Decision::NoOp(_)));
        assert!(group.uncommitted_events().is_empty());
    }
}
