//! The transaction record and its composition seam
//!
//! [`TransactionRecord`] is one concrete, composable type carrying the
//! coordination fields: identity, kind, state, recovery flag and the last
//! captured error. Entity kinds with their own payload embed a record and
//! implement [`Transactional`]; the coordinator is generic over the trait
//! and only ever touches the embedded record.
//!
//! Field invariants enforced here:
//! - `kind` is fixed at construction and cannot be reassigned
//! - `recovery` is monotonic: once true it can never go back to false
//!
//! The persisted document shape is declared statically through the serde
//! field attributes: `_id`, `type`, `state`, `recovery`, `error`.

use crate::document::{Document, RecordId};
use crate::error::{Error, Result};
use crate::error_record::ErrorRecord;
use crate::state::TransactionState;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Symbolic tag identifying a transaction's kind.
///
/// Supplied explicitly at construction for each transaction kind; never
/// derived from type introspection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionKind(String);

impl TransactionKind {
    /// A kind with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        TransactionKind(tag.into())
    }

    /// The tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransactionKind {
    fn from(tag: &str) -> Self {
        TransactionKind::new(tag)
    }
}

/// The transaction data entity.
///
/// Created in memory in `Initial` state, assigned an id on the first
/// successful persist, and from then on mutated exclusively through
/// coordinator transitions or recovery. Records are never hard-deleted
/// except while still `Initial` or `Aborted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(rename = "_id")]
    id: Option<RecordId>,
    #[serde(rename = "type")]
    kind: TransactionKind,
    state: TransactionState,
    #[serde(default)]
    recovery: bool,
    error: Option<ErrorRecord>,
}

impl TransactionRecord {
    /// A fresh record of the given kind, in `Initial` state.
    pub fn new(kind: TransactionKind) -> Self {
        Self {
            id: None,
            kind,
            state: TransactionState::Initial,
            recovery: false,
            error: None,
        }
    }

    /// Identity, absent until the first successful persist.
    pub fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    /// Assign the identity. Intended for the persistence layer.
    pub fn set_id(&mut self, id: RecordId) -> &mut Self {
        self.id = Some(id);
        self
    }

    /// Drop the identity again, e.g. when an insert did not go through.
    pub fn clear_id(&mut self) -> &mut Self {
        self.id = None;
        self
    }

    /// The record's kind tag.
    pub fn kind(&self) -> &TransactionKind {
        &self.kind
    }

    /// Re-assert the record's kind.
    ///
    /// The kind is fixed at construction; any attempt to set a different
    /// value fails with [`Error::InvalidArgument`].
    pub fn set_kind(&mut self, kind: TransactionKind) -> Result<&mut Self> {
        if self.kind != kind {
            return Err(Error::InvalidArgument(format!(
                "the only allowed kind for this record is \"{}\", \"{}\" given",
                self.kind, kind
            )));
        }
        Ok(self)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Set the lifecycle state.
    ///
    /// Legality of the movement is enforced by the coordinator, which is
    /// the only caller outside of tests and hydration.
    pub fn set_state(&mut self, state: TransactionState) -> &mut Self {
        self.state = state;
        self
    }

    /// True once a recovery procedure has started on this record.
    pub fn recovery(&self) -> bool {
        self.recovery
    }

    /// Set the recovery flag.
    ///
    /// The flag is monotonic: setting it back to false once it has been
    /// switched to true fails with [`Error::InvalidArgument`].
    pub fn set_recovery(&mut self, recovery: bool) -> Result<&mut Self> {
        if self.recovery && !recovery {
            return Err(Error::InvalidArgument(
                "recovery field is not reversible: it cannot be set to false once it has been switched to true"
                    .to_string(),
            ));
        }
        self.recovery = recovery;
        Ok(self)
    }

    /// The last captured failure, if any.
    pub fn error(&self) -> Option<&ErrorRecord> {
        self.error.as_ref()
    }

    /// Attach a failure snapshot.
    pub fn set_error(&mut self, error: ErrorRecord) -> &mut Self {
        self.error = Some(error);
        self
    }

    /// Remove the failure snapshot.
    pub fn clear_error(&mut self) -> &mut Self {
        self.error = None;
        self
    }

    /// Encode this record into its persisted document shape.
    pub fn to_document(&self) -> Result<Document> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(Error::Runtime(format!(
                "record encoded to a non-document value: {}",
                other
            ))),
            Err(e) => Err(Error::InvalidArgument(format!(
                "record cannot be encoded into a document: {}",
                e
            ))),
        }
    }

    /// Decode a persisted document into a record.
    ///
    /// Unknown document fields are ignored, so the base record can be read
    /// out of documents belonging to embedding kinds.
    pub fn from_document(doc: &Document) -> Result<Self> {
        serde_json::from_value(Value::Object(doc.clone())).map_err(|e| {
            Error::InvalidArgument(format!("malformed transaction document: {}", e))
        })
    }

    /// Overwrite every field of this record with the document's fields.
    ///
    /// Used by recovery when the persisted copy is ground truth. A
    /// document of a different kind is refused.
    pub fn load_document(&mut self, doc: &Document) -> Result<()> {
        let fetched = Self::from_document(doc)?;
        if fetched.kind != self.kind {
            return Err(Error::InvalidArgument(format!(
                "cannot load a \"{}\" document into a \"{}\" record",
                fetched.kind, self.kind
            )));
        }
        *self = fetched;
        Ok(())
    }
}

/// Composition seam for entity kinds that carry transaction behavior.
///
/// Implementors embed a [`TransactionRecord`] and expose it through the
/// two accessors. Kinds with extra persisted fields override the codec
/// methods so their whole document round-trips; the defaults persist the
/// embedded record alone.
pub trait Transactional {
    /// The embedded transaction record.
    fn record(&self) -> &TransactionRecord;

    /// The embedded transaction record, mutably.
    fn record_mut(&mut self) -> &mut TransactionRecord;

    /// Encode the full entity into its persisted document shape.
    fn to_document(&self) -> Result<Document> {
        self.record().to_document()
    }

    /// Overwrite the entity from a persisted document.
    fn load_document(&mut self, doc: &Document) -> Result<()> {
        self.record_mut().load_document(doc)
    }
}

impl Transactional for TransactionRecord {
    fn record(&self) -> &TransactionRecord {
        self
    }

    fn record_mut(&mut self) -> &mut TransactionRecord {
        self
    }
}
