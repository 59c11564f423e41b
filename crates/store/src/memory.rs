//! In-process document store
//!
//! Backs tests and demos with the exact affected-count semantics the
//! coordinator depends on. Durable writes are appended to a journal so
//! tests can assert that a failed operation performed no persistence
//! call.

use crate::concern::WriteConcern;
use crate::{PersistenceStore, WriteMode};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use tandem_core::{Document, RecordId, Result};

/// Kind of journaled store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JournalOp {
    /// A conditional write that affected one document
    Write,
    /// A conditional remove that affected one document
    Remove,
}

/// One durably acknowledged store operation.
#[derive(Debug, Clone, Serialize)]
pub struct JournalEntry {
    /// What the operation was
    pub op: JournalOp,
    /// The document it targeted
    pub id: RecordId,
    /// When it was acknowledged
    pub at: DateTime<Utc>,
}

/// In-memory [`PersistenceStore`].
///
/// Identity-scoped operations map directly onto a concurrent map; the
/// journal records every write or remove acknowledged under a durable
/// concern. Operations that affect zero documents are not journaled.
#[derive(Default)]
pub struct MemoryStore {
    documents: DashMap<RecordId, Document>,
    journal: Mutex<Vec<JournalEntry>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True when the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of journaled durable operations.
    pub fn journal_len(&self) -> usize {
        self.journal.lock().len()
    }

    /// Snapshot of the durable-operation journal.
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.journal.lock().clone()
    }

    fn record_durable(&self, op: JournalOp, id: &RecordId, concern: &WriteConcern) {
        if concern.is_durable() {
            self.journal.lock().push(JournalEntry {
                op,
                id: *id,
                at: Utc::now(),
            });
        }
    }
}

impl PersistenceStore for MemoryStore {
    fn find_by_id(&self, id: &RecordId) -> Result<Option<Document>> {
        Ok(self.documents.get(id).map(|entry| entry.value().clone()))
    }

    fn conditional_write(
        &self,
        id: &RecordId,
        document: &Document,
        concern: &WriteConcern,
        mode: WriteMode,
    ) -> Result<u64> {
        let affected = match mode {
            WriteMode::MustExist => match self.documents.get_mut(id) {
                Some(mut entry) => {
                    *entry.value_mut() = document.clone();
                    1
                }
                None => 0,
            },
            WriteMode::Upsert => {
                self.documents.insert(*id, document.clone());
                1
            }
        };
        if affected == 1 {
            self.record_durable(JournalOp::Write, id, concern);
            tracing::debug!(%id, ?mode, "document written");
        } else {
            tracing::debug!(%id, ?mode, "conditional write matched no document");
        }
        Ok(affected)
    }

    fn conditional_remove(&self, id: &RecordId, concern: &WriteConcern) -> Result<u64> {
        match self.documents.remove(id) {
            Some(_) => {
                self.record_durable(JournalOp::Remove, id, concern);
                tracing::debug!(%id, "document removed");
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
