//! Shared error taxonomy for tandem
//!
//! Four classes of failure cross the coordination boundary:
//! - `InvalidArgument`: malformed input to a setter or call
//! - `Domain`: a legality violation of the coordination contract
//! - `Runtime`: an unexpected persistence outcome or integrity failure
//! - `RollbackVeto`: a cohort's refusal to unwind, meaningful only in the
//!   begin-rollback pre phase
//!
//! `Listener` carries cohort-raised failures, optionally with a diagnostic
//! code and ordered structured details; those fields are copied into the
//! record's [`ErrorRecord`](crate::error_record::ErrorRecord) when a
//! transition fails.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Result type for tandem operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Diagnostic code attached to a failure: numeric or textual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    /// Numeric code
    Int(i64),
    /// Textual code
    Text(String),
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Int(n) => write!(f, "{}", n),
            ErrorCode::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ErrorCode {
    fn from(n: i64) -> Self {
        ErrorCode::Int(n)
    }
}

impl From<&str> for ErrorCode {
    fn from(s: &str) -> Self {
        ErrorCode::Text(s.to_string())
    }
}

/// All tandem errors.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Malformed input to a setter or call
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Legality violation of the coordination contract
    #[error("domain violation: {0}")]
    Domain(String),

    /// Unexpected persistence outcome or integrity failure
    #[error("runtime failure: {0}")]
    Runtime(String),

    /// A cohort refused a rollback.
    ///
    /// This is a signal, not a fault: the coordinator honors it only when
    /// it surfaces from the `beginRollback.pre` phase during recovery.
    /// Anywhere else it is remapped to a fatal [`Error::Domain`].
    #[error("rollback vetoed: {reason}")]
    RollbackVeto {
        /// The cohort's stated reason for refusing
        reason: String,
    },

    /// A cohort listener failed, optionally with diagnostic code and details
    #[error("listener failure: {message}")]
    Listener {
        /// Human-readable failure description
        message: String,
        /// Optional diagnostic code
        code: Option<ErrorCode>,
        /// Ordered structured details, copied into the error record
        details: Map<String, Value>,
    },
}

impl Error {
    /// A rollback-veto signal with the given reason.
    pub fn veto(reason: impl Into<String>) -> Self {
        Error::RollbackVeto { reason: reason.into() }
    }

    /// A cohort listener failure with no code or details.
    pub fn listener(message: impl Into<String>) -> Self {
        Error::Listener {
            message: message.into(),
            code: None,
            details: Map::new(),
        }
    }

    /// A cohort listener failure carrying a code and ordered details.
    pub fn listener_with_details(
        message: impl Into<String>,
        code: Option<ErrorCode>,
        details: Map<String, Value>,
    ) -> Self {
        Error::Listener {
            message: message.into(),
            code,
            details,
        }
    }

    /// Canonical kind string for this error, as recorded in error records.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidArgument(_) => "InvalidArgument",
            Error::Domain(_) => "Domain",
            Error::Runtime(_) => "Runtime",
            Error::RollbackVeto { .. } => "RollbackVeto",
            Error::Listener { .. } => "Listener",
        }
    }

    /// Diagnostic code, when the failure carries one.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Error::Listener { code, .. } => code.clone(),
            _ => None,
        }
    }

    /// Structured details, when the failure exposes any.
    ///
    /// Errors without details return `None`; callers copying details into
    /// an error record treat that as an empty mapping.
    pub fn details(&self) -> Option<&Map<String, Value>> {
        match self {
            Error::Listener { details, .. } if !details.is_empty() => Some(details),
            _ => None,
        }
    }

    /// Check if this is an invalid-argument error.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }

    /// Check if this is a domain (contract legality) error.
    pub fn is_domain(&self) -> bool {
        matches!(self, Error::Domain(_))
    }

    /// Check if this is a runtime/integrity error.
    pub fn is_runtime(&self) -> bool {
        matches!(self, Error::Runtime(_))
    }

    /// Check if this is a rollback-veto signal.
    pub fn is_veto(&self) -> bool {
        matches!(self, Error::RollbackVeto { .. })
    }
}
