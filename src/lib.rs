//! # tandem
//!
//! Two-phase transaction coordination for single-document stores.
//!
//! tandem emulates two-phase-commit semantics for a logical transaction
//! record stored in a document database that only offers single-document
//! atomicity. A coordinator drives the record through a fixed sequence of
//! guarded transitions, each published to cohorts before and after its
//! durable write; if a worker dies partway, any later worker can recover
//! the record from the persisted copy and resume or unwind it.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use tandem::prelude::*;
//!
//! # fn main() -> tandem::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let coordinator = TransactionCoordinator::new(store);
//!
//! // Cohorts perform their (idempotent) side effects in the commit
//! // pre phase and may observe every other lifecycle event.
//! coordinator.events().subscribe("commitTransaction.pre", |event| {
//!     println!("applying side effects for {}", event.criteria());
//!     Ok(())
//! });
//!
//! let mut transfer = TransactionRecord::new(TransactionKind::new("Transfer"));
//! coordinator.save(&mut transfer)?;
//! coordinator.process(&mut transfer)?;
//! assert_eq!(transfer.state(), TransactionState::Done);
//!
//! // After a crash, any worker resumes from the persisted copy:
//! coordinator.recover(&mut transfer, true)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! - `tandem-core`: record, states, operations, error taxonomy
//! - `tandem-events`: synchronous lifecycle event bus
//! - `tandem-store`: persistence contract, write concern, in-memory store
//! - `tandem-coordinator`: the state machine engine

#![warn(missing_docs)]

pub mod prelude;

// The coordinator engine
pub use tandem_coordinator::{CoordinatorBuilder, TransactionCoordinator};

// The data model
pub use tandem_core::{
    Document, Error, ErrorCode, ErrorRecord, RecordCriteria, RecordId, Result, TransactionKind,
    TransactionOperation, TransactionRecord, TransactionState, Transactional,
};

// Event plumbing
pub use tandem_events::{EventBus, Phase, TransitionEvent};

// Persistence
pub use tandem_store::{
    Acknowledgment, JournalEntry, JournalOp, MemoryStore, PersistenceStore, WriteConcern, WriteMode,
};
