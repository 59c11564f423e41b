//! Record identity and persisted-document types
//!
//! Documents are ordered JSON maps; identity is a UUID assigned on the
//! first successful persist. [`RecordCriteria`] is the only lookup shape
//! the coordinator accepts: identity-scoped, so every conditional write
//! and remove targets exactly one document.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Persisted document shape: an ordered map of field name to JSON value.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Unique identity of a persisted transaction record.
///
/// Absent from a record until its first successful persist; a record
/// without an id has never been durably created and no transition may be
/// attempted on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Create a new random id (UUID v4).
    pub fn new() -> Self {
        RecordId(Uuid::new_v4())
    }

    /// Parse an id from its string form.
    pub fn parse(s: &str) -> Result<Self, Error> {
        Uuid::parse_str(s)
            .map(RecordId)
            .map_err(|e| Error::InvalidArgument(format!("\"{}\" is not a valid record id: {}", s, e)))
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity-scoped lookup criteria.
///
/// Wraps the one id a store operation is allowed to touch. Constructing
/// the criteria is the only way to address a record, so writes and removes
/// are isolated to a single document by type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordCriteria {
    id: RecordId,
}

impl RecordCriteria {
    /// Criteria targeting the given record id.
    pub fn new(id: RecordId) -> Self {
        Self { id }
    }

    /// The targeted id.
    pub fn id(&self) -> &RecordId {
        &self.id
    }
}

impl fmt::Display for RecordCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id={}", self.id)
    }
}
