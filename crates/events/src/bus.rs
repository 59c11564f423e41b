//! Synchronous named pub/sub
//!
//! Listeners are registered under exact event names and invoked in
//! registration order on the publisher's thread. Dispatch holds no lock
//! while listeners run, so a listener may subscribe further listeners
//! without deadlocking; additions only take effect for later publishes.

use crate::event::TransitionEvent;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tandem_core::Result;

/// A registered listener.
///
/// Returning `Ok(())` continues dispatch; returning an error stops
/// further dispatch and propagates the error to the publisher. There is
/// no way to stop propagation without an error.
pub type Listener = Arc<dyn for<'a> Fn(&TransitionEvent<'a>) -> Result<()> + Send + Sync>;

/// Synchronous, name-keyed event bus.
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<HashMap<String, Vec<Listener>>>,
}

impl EventBus {
    /// An empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener under the given event name.
    ///
    /// Listeners registered under the same name run in registration
    /// order.
    pub fn subscribe<F>(&self, event_name: impl Into<String>, listener: F)
    where
        F: for<'a> Fn(&TransitionEvent<'a>) -> Result<()> + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .entry(event_name.into())
            .or_default()
            .push(Arc::new(listener));
    }

    /// Publish an event to every listener registered under `event_name`.
    ///
    /// Fan-out is synchronous and in registration order. The first
    /// listener error stops dispatch; listeners registered after the
    /// failing one are not invoked.
    pub fn publish(&self, event_name: &str, event: &TransitionEvent<'_>) -> Result<()> {
        let snapshot: Vec<Listener> = self
            .listeners
            .read()
            .get(event_name)
            .cloned()
            .unwrap_or_default();
        for listener in snapshot {
            listener(event)?;
        }
        Ok(())
    }

    /// Number of listeners registered under the given name.
    pub fn listener_count(&self, event_name: &str) -> usize {
        self.listeners
            .read()
            .get(event_name)
            .map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.listeners.read();
        let mut names: Vec<_> = listeners.keys().collect();
        names.sort();
        f.debug_struct("EventBus").field("events", &names).finish()
    }
}
