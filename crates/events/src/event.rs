//! Transition event payload

use std::fmt;
use tandem_core::{RecordCriteria, TransactionOperation, TransactionRecord};

/// Which side of the durable write an event is published on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Before any in-memory mutation or persistence; a listener failure
    /// here vetoes the transition with nothing to undo
    Pre,
    /// After the new state has been durably persisted
    Post,
}

/// Payload handed to every listener of a transition event.
///
/// Carries the operation being performed, the phase, a reference to the
/// transaction record (in its pre- or post-mutation state, matching the
/// phase) and the identity-scoped criteria the durable write is targeting.
/// Listeners needing other collaborators close over them at subscription
/// time.
pub struct TransitionEvent<'a> {
    operation: TransactionOperation,
    phase: Phase,
    record: &'a TransactionRecord,
    criteria: RecordCriteria,
}

impl<'a> TransitionEvent<'a> {
    /// A transition event for the given operation and phase.
    pub fn new(
        operation: TransactionOperation,
        phase: Phase,
        record: &'a TransactionRecord,
        criteria: RecordCriteria,
    ) -> Self {
        Self {
            operation,
            phase,
            record,
            criteria,
        }
    }

    /// The operation being performed.
    pub fn operation(&self) -> TransactionOperation {
        self.operation
    }

    /// Pre or post phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The transaction record driving the transition.
    pub fn record(&self) -> &TransactionRecord {
        self.record
    }

    /// Identity-scoped criteria of the durable write.
    pub fn criteria(&self) -> &RecordCriteria {
        &self.criteria
    }

    /// Full event name, e.g. `"beginRollback.pre"`.
    pub fn name(&self) -> &'static str {
        match self.phase {
            Phase::Pre => self.operation.pre_event(),
            Phase::Post => self.operation.post_event(),
        }
    }
}

impl fmt::Debug for TransitionEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionEvent")
            .field("name", &self.name())
            .field("criteria", &self.criteria)
            .field("state", &self.record.state())
            .finish()
    }
}
