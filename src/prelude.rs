//! Convenient imports for tandem.
//!
//! Re-exports the types almost every caller needs:
//!
//! ```
//! use tandem::prelude::*;
//! ```

// Main entry point
pub use crate::{CoordinatorBuilder, TransactionCoordinator};

// Error handling
pub use crate::{Error, Result};

// The data model
pub use crate::{TransactionKind, TransactionRecord, TransactionState, Transactional};

// Persistence
pub use crate::{MemoryStore, PersistenceStore, RecordCriteria, WriteConcern};

// Events
pub use crate::{EventBus, TransitionEvent};

// Re-export serde_json for convenience
pub use serde_json::json;
