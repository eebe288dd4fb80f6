//! Stream ownership: which aggregate kind owns which stream id.
//!
//! Every stream belongs to exactly one aggregate kind for mutation. The
//! registry holds the rule that turns an entity id into the stream id for a
//! kind, and is injected wherever streams are addressed.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The aggregate kinds that own event streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    /// A prosecution case.
    Case,
    /// A group of linked cases.
    Group,
    /// A civil fee record.
    Fee,
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Case => "case",
            Self::Group => "group",
            Self::Fee => "fee",
        };
        f.write_str(name)
    }
}

/// How a stream id is derived from an entity id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamIdRule {
    /// The stream id is the entity id.
    EntityId,
    /// The stream id is the v5 UUID of the entity id under `namespace`.
    NameBased {
        /// Namespace separating this kind's streams from every other kind.
        namespace: Uuid,
    },
}

impl StreamIdRule {
    fn derive(self, entity_id: Uuid) -> Uuid {
        match self {
            Self::EntityId => entity_id,
            Self::NameBased { namespace } => Uuid::new_v5(&namespace, entity_id.as_bytes()),
        }
    }
}

/// Typed registry mapping aggregate kind to its stream-id rule.
#[derive(Debug, Clone)]
pub struct StreamRegistry {
    rules: HashMap<AggregateKind, StreamIdRule>,
}

impl StreamRegistry {
    /// Creates a registry where every kind uses [`StreamIdRule::EntityId`].
    #[must_use]
    pub fn new() -> Self {
        let rules = [AggregateKind::Case, AggregateKind::Group, AggregateKind::Fee]
            .into_iter()
            .map(|kind| (kind, StreamIdRule::EntityId))
            .collect();
        Self { rules }
    }

    /// Replaces the rule for one kind.
    #[must_use]
    pub fn with_rule(mut self, kind: AggregateKind, rule: StreamIdRule) -> Self {
        self.rules.insert(kind, rule);
        self
    }

    /// Returns the stream id owned by `kind` for `entity_id`.
    #[must_use]
    pub fn stream_id(&self, kind: AggregateKind, entity_id: Uuid) -> Uuid {
        self.rules
            .get(&kind)
            .copied()
            .unwrap_or(StreamIdRule::EntityId)
            .derive(entity_id)
    }
}

impl Default for StreamRegistry {
    fn default() -> Self {
        Self::new()
    }
}
