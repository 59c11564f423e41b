//! Core types for tandem
//!
//! This crate defines the data model shared by every other tandem crate:
//! - [`TransactionState`]: the transaction lifecycle states
//! - [`TransactionOperation`]: the legal-transition table and event names
//! - [`TransactionRecord`]: the composable transaction entity
//! - [`Transactional`]: the composition seam for embedding entity kinds
//! - [`ErrorRecord`]: the failure snapshot attached to records
//! - [`Error`]: the shared error taxonomy
//!
//! Nothing in this crate performs I/O; persistence and event dispatch live
//! in `tandem-store` and `tandem-events`.

pub mod document;
pub mod error;
pub mod error_record;
pub mod operation;
pub mod record;
pub mod state;

pub use document::{Document, RecordCriteria, RecordId};
pub use error::{Error, ErrorCode, Result};
pub use error_record::ErrorRecord;
pub use operation::TransactionOperation;
pub use record::{TransactionKind, TransactionRecord, Transactional};
pub use state::TransactionState;
