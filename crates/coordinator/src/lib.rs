//! Two-phase transaction coordination for tandem
//!
//! This crate provides [`TransactionCoordinator`], the state machine
//! engine that drives a transaction record through its legal transitions,
//! persists every transition through a [`PersistenceStore`]
//! (`tandem-store`), notifies cohorts through an `EventBus`
//! (`tandem-events`), captures failures into the record, and recovers
//! interrupted transactions from the persisted copy.

pub mod coordinator;

pub use coordinator::{CoordinatorBuilder, TransactionCoordinator};
