//! Persistence contract for tandem
//!
//! The coordinator talks to its document store through the
//! [`PersistenceStore`] trait: durable, single-document conditional
//! read/write/remove by identity. Every write and remove returns the
//! number of documents actually affected; the coordinator treats anything
//! other than exactly one as a fatal integrity error.
//!
//! [`MemoryStore`] is the in-process implementation used by tests and
//! demos; production deployments implement the trait over a real document
//! database driver.

pub mod concern;
pub mod memory;

pub use concern::{Acknowledgment, WriteConcern};
pub use memory::{JournalEntry, JournalOp, MemoryStore};

use tandem_core::{Document, RecordId, Result};

/// How a conditional write treats a missing target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the identified document only if it exists; a missing
    /// target affects zero documents. Used by state transitions.
    MustExist,
    /// Insert the document if the identity is new, replace it otherwise.
    /// Used when the transaction header is first saved.
    Upsert,
}

/// Durable, single-document conditional persistence by identity.
///
/// All cross-process mutual exclusion tandem relies on is delegated to
/// this contract: every operation is scoped to exactly one identified
/// document, and writes acknowledged under a validated [`WriteConcern`]
/// must be visible to any subsequent reader anywhere in the cluster.
pub trait PersistenceStore {
    /// Fetch the document with the given identity, if present.
    fn find_by_id(&self, id: &RecordId) -> Result<Option<Document>>;

    /// Conditionally write the document identified by `id`.
    ///
    /// Returns the number of documents affected. The write must not be
    /// acknowledged before the durability requested by `concern` holds.
    fn conditional_write(
        &self,
        id: &RecordId,
        document: &Document,
        concern: &WriteConcern,
        mode: WriteMode,
    ) -> Result<u64>;

    /// Conditionally remove the document identified by `id`.
    ///
    /// Returns the number of documents affected.
    fn conditional_remove(&self, id: &RecordId, concern: &WriteConcern) -> Result<u64>;
}
