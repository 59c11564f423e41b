//! Transaction lifecycle states
//!
//! A transaction record moves along a fixed set of states. The wire
//! representation is the lowercase state name; any other string is
//! rejected when a persisted document is decoded.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// State of a transaction record.
///
/// `Initial` is the creation state, `Canceling` is the only intermediate
/// rollback state, and `Done`, `Cancelled` and `Aborted` are terminal.
/// Legal movements between states are owned by
/// [`TransactionOperation`](crate::operation::TransactionOperation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionState {
    /// Created in memory, side effects not yet visible to any cohort
    Initial,
    /// Two-phase sequence started, cohort side effects may be in flight
    Pending,
    /// Commit durably applied, only the terminal marking remains
    Applied,
    /// Terminal: committed and completed
    Done,
    /// Rollback begun, unwind in progress
    Canceling,
    /// Terminal: rolled back
    Cancelled,
    /// Terminal: abandoned before the sequence started
    Aborted,
}

/// Every state, in declaration order. Used by table-driven tests.
pub const ALL_STATES: [TransactionState; 7] = [
    TransactionState::Initial,
    TransactionState::Pending,
    TransactionState::Applied,
    TransactionState::Done,
    TransactionState::Canceling,
    TransactionState::Cancelled,
    TransactionState::Aborted,
];

impl TransactionState {
    /// Wire string for this state, as persisted in documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionState::Initial => "initial",
            TransactionState::Pending => "pending",
            TransactionState::Applied => "applied",
            TransactionState::Done => "done",
            TransactionState::Canceling => "canceling",
            TransactionState::Cancelled => "cancelled",
            TransactionState::Aborted => "aborted",
        }
    }

    /// True for states with no outgoing transitions.
    ///
    /// A terminal record is never touched again by the coordinator;
    /// recovery of a terminal record performs no I/O.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionState::Done | TransactionState::Cancelled | TransactionState::Aborted
        )
    }
}

impl Default for TransactionState {
    fn default() -> Self {
        TransactionState::Initial
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for state in ALL_STATES {
            if state.as_str() == s {
                return Ok(state);
            }
        }
        Err(Error::InvalidArgument(format!("\"{}\" is not a valid state", s)))
    }
}
