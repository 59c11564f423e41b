//! Coordinator operations and the legal-transition table
//!
//! Each operation names one edge of the transaction state machine and the
//! pair of lifecycle events (`<name>.pre`, `<name>.post`) published around
//! its durable write. The table here is the single source of truth for
//! which transitions are legal; the coordinator refuses everything else
//! before performing any I/O.

use crate::state::TransactionState;
use std::fmt;

/// A coordinator operation: one legal edge of the state machine.
///
/// | Operation | From | To |
/// |---|---|---|
/// | `BeginTransaction` | `Initial` | `Pending` |
/// | `CommitTransaction` | `Pending` | `Applied` |
/// | `CompleteTransaction` | `Applied` | `Done` |
/// | `BeginRollback` | `Pending` | `Canceling` |
/// | `CompleteRollback` | `Canceling` | `Cancelled` |
/// | `AbortTransaction` | `Initial` | `Aborted` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionOperation {
    /// Take ownership of the record and start the two-phase sequence
    BeginTransaction,
    /// Apply the commit; cohort side effects in the pre phase must be idempotent
    CommitTransaction,
    /// Mark the transaction done; pre-phase listeners release locks and clean up
    CompleteTransaction,
    /// Start unwinding a pending transaction
    BeginRollback,
    /// Finish the unwind
    CompleteRollback,
    /// Abandon a transaction that never started
    AbortTransaction,
}

/// Every operation, in the order the happy path and rollback path use them.
pub const ALL_OPERATIONS: [TransactionOperation; 6] = [
    TransactionOperation::BeginTransaction,
    TransactionOperation::CommitTransaction,
    TransactionOperation::CompleteTransaction,
    TransactionOperation::BeginRollback,
    TransactionOperation::CompleteRollback,
    TransactionOperation::AbortTransaction,
];

impl TransactionOperation {
    /// State the record must be in for this operation to be legal.
    pub fn from_state(&self) -> TransactionState {
        match self {
            TransactionOperation::BeginTransaction => TransactionState::Initial,
            TransactionOperation::CommitTransaction => TransactionState::Pending,
            TransactionOperation::CompleteTransaction => TransactionState::Applied,
            TransactionOperation::BeginRollback => TransactionState::Pending,
            TransactionOperation::CompleteRollback => TransactionState::Canceling,
            TransactionOperation::AbortTransaction => TransactionState::Initial,
        }
    }

    /// State the record ends in when this operation succeeds.
    pub fn to_state(&self) -> TransactionState {
        match self {
            TransactionOperation::BeginTransaction => TransactionState::Pending,
            TransactionOperation::CommitTransaction => TransactionState::Applied,
            TransactionOperation::CompleteTransaction => TransactionState::Done,
            TransactionOperation::BeginRollback => TransactionState::Canceling,
            TransactionOperation::CompleteRollback => TransactionState::Cancelled,
            TransactionOperation::AbortTransaction => TransactionState::Aborted,
        }
    }

    /// Operation name as used in event names and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            TransactionOperation::BeginTransaction => "beginTransaction",
            TransactionOperation::CommitTransaction => "commitTransaction",
            TransactionOperation::CompleteTransaction => "completeTransaction",
            TransactionOperation::BeginRollback => "beginRollback",
            TransactionOperation::CompleteRollback => "completeRollback",
            TransactionOperation::AbortTransaction => "abortTransaction",
        }
    }

    /// Name of the event published before the durable write.
    ///
    /// A listener failure at this point vetoes the transition: nothing has
    /// been mutated or persisted yet.
    pub fn pre_event(&self) -> &'static str {
        match self {
            TransactionOperation::BeginTransaction => "beginTransaction.pre",
            TransactionOperation::CommitTransaction => "commitTransaction.pre",
            TransactionOperation::CompleteTransaction => "completeTransaction.pre",
            TransactionOperation::BeginRollback => "beginRollback.pre",
            TransactionOperation::CompleteRollback => "completeRollback.pre",
            TransactionOperation::AbortTransaction => "abortTransaction.pre",
        }
    }

    /// Name of the event published after the durable write.
    pub fn post_event(&self) -> &'static str {
        match self {
            TransactionOperation::BeginTransaction => "beginTransaction.post",
            TransactionOperation::CommitTransaction => "commitTransaction.post",
            TransactionOperation::CompleteTransaction => "completeTransaction.post",
            TransactionOperation::BeginRollback => "beginRollback.post",
            TransactionOperation::CompleteRollback => "completeRollback.post",
            TransactionOperation::AbortTransaction => "abortTransaction.post",
        }
    }
}

impl fmt::Display for TransactionOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
