//! Synchronous lifecycle events for tandem
//!
//! Cohorts observe and veto transaction transitions by subscribing to the
//! [`EventBus`]. Dispatch is synchronous, on the caller's thread, in
//! registration order; a listener returning an error stops further
//! dispatch and aborts the transition in progress.

pub mod bus;
pub mod event;

pub use bus::EventBus;
pub use event::{Phase, TransitionEvent};
