//! Decision and command outcome types.

use crate::repository::StoredEvent;

/// Result of asking an aggregate to decide on a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The given number of events were staged as uncommitted.
    Emitted(usize),
    /// The aggregate is already in the requested state.
    NoOp(String),
    /// A business rule refused the command. Nothing was staged.
    Rejected(String),
}

impl Decision {
    /// Returns `true` if the decision staged at least one event.
    #[must_use]
    pub fn is_emitted(&self) -> bool {
        matches!(self, Self::Emitted(n) if *n > 0)
    }
}

/// Terminal result of processing one command, across every stream it touched.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// Events were durably appended, in append order.
    Applied {
        /// Every appended event.
        events: Vec<StoredEvent>,
    },
    /// Nothing needed doing; typically a duplicate delivery.
    NoOp {
        /// Why nothing was appended.
        reason: String,
    },
    /// A business rule refused the command. Nothing was appended.
    Rejected {
        /// The refusal reason.
        reason: String,
    },
}

impl CommandOutcome {
    /// Builds the outcome of a single-aggregate command from its decision and
    /// the events that were appended for it.
    #[must_use]
    pub fn from_decision(decision: Decision, events: Vec<StoredEvent>) -> Self {
        match decision {
            Decision::Emitted(_) => Self::Applied { events },
            Decision::NoOp(reason) => Self::NoOp { reason },
            Decision::Rejected(reason) => Self::Rejected { reason },
        }
    }

    /// Returns the appended events, empty unless `Applied`.
    #[must_use]
    pub fn events(&self) -> &[StoredEvent] {
        match self {
            Self::Applied { events } => events,
            Self::NoOp { .. } | Self::Rejected { .. } => &[],
        }
    }

    /// Short machine-readable label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Applied { .. } => "applied",
            Self::NoOp { .. } => "no_op",
            Self::Rejected { .. } => "rejected",
        }
    }
}
