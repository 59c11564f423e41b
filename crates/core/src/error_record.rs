//! Failure snapshots attached to transaction records
//!
//! When a transition attempt fails, the coordinator captures the failure
//! into an [`ErrorRecord`] on the record before re-raising it. The
//! snapshot is persisted as part of the transaction document (under the
//! `error` key) so a later recoverer can see what went wrong, but it is
//! never independently owned and never required to be cleared.

use crate::error::{Error, ErrorCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Snapshot of a failure: kind, code, message and structured details.
///
/// Built by copying fields out of a caught [`Error`]. Failures that expose
/// no structured details produce an empty detail mapping; detail sources
/// are never required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Canonical kind of the failure (e.g. `"Domain"`, `"RollbackVeto"`)
    exception_kind: Option<String>,
    /// Diagnostic code, numeric or textual
    code: Option<ErrorCode>,
    /// Human-readable failure description
    message: Option<String>,
    /// Ordered key/value details, defaults empty
    #[serde(default)]
    additional_details: Map<String, Value>,
}

impl ErrorRecord {
    /// An empty error record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture a failure into a fresh record.
    pub fn capture(err: &Error) -> Self {
        let mut record = Self::new();
        record.set_exception_kind(Some(err.kind().to_string()));
        record.set_code(err.code());
        record.set_message(Some(err.to_string()));
        record.set_additional_details(err.details().cloned());
        record
    }

    /// Canonical kind of the captured failure.
    pub fn exception_kind(&self) -> Option<&str> {
        self.exception_kind.as_deref()
    }

    /// Set the failure kind; an empty string clears it.
    pub fn set_exception_kind(&mut self, kind: Option<String>) -> &mut Self {
        self.exception_kind = kind.filter(|k| !k.is_empty());
        self
    }

    /// Diagnostic code of the captured failure.
    pub fn code(&self) -> Option<&ErrorCode> {
        self.code.as_ref()
    }

    /// Set the diagnostic code.
    ///
    /// Numeric codes are kept as-is; an empty textual code clears the
    /// field.
    pub fn set_code(&mut self, code: Option<ErrorCode>) -> &mut Self {
        self.code = code.filter(|c| !matches!(c, ErrorCode::Text(s) if s.is_empty()));
        self
    }

    /// Message of the captured failure.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Set the message; an empty string clears it.
    pub fn set_message(&mut self, message: Option<String>) -> &mut Self {
        self.message = message.filter(|m| !m.is_empty());
        self
    }

    /// Ordered structured details of the captured failure.
    pub fn additional_details(&self) -> &Map<String, Value> {
        &self.additional_details
    }

    /// Replace the detail mapping; `None` resets it to empty.
    pub fn set_additional_details(&mut self, details: Option<Map<String, Value>>) -> &mut Self {
        self.additional_details = details.unwrap_or_default();
        self
    }
}
