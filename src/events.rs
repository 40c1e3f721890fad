//! Bridges caller-supplied event handlers onto the live field instance.
//!
//! Registration is idempotent per (instance identity, event type): the host
//! re-syncs the subscription map on every update, and the bridge makes sure
//! the SDK sees each handler exactly once per instance. A replacement
//! instance carries a fresh identity, so its handlers are registered anew.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::lifecycle::FieldHandle;
use crate::sdk::EventHandler;

/// Mapping from event-type name to handler.
pub type EventSubscriptionMap = HashMap<String, EventHandler>;

/// Tracks which (instance, event type) pairs are already bound.
#[derive(Default)]
pub struct EventBridge {
    bound: Mutex<HashSet<(Uuid, String)>>,
}

impl EventBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every not-yet-bound handler on the instance.
    ///
    /// With no instance this is a no-op; registration is simply deferred
    /// until one exists. Repeated calls with the same instance and map do
    /// nothing. A changed closure for an already-bound pair is ignored for
    /// that instance's lifetime; it takes a new instance to rebind.
    pub fn sync(&self, handle: Option<&FieldHandle>, callbacks: &EventSubscriptionMap) {
        let Some(handle) = handle else {
            return;
        };

        let mut bound = self.bound.lock();
        for (event_type, handler) in callbacks {
            let key = (handle.instance_id(), event_type.clone());
            if bound.insert(key) {
                handle.field().add_event_listener(event_type, handler.clone());
                tracing::debug!(
                    instance = %handle.instance_id(),
                    event = %event_type,
                    "event handler registered"
                );
            }
        }
    }

    /// Drops bookkeeping for a destroyed instance.
    pub fn release(&self, instance_id: Uuid) {
        self.bound.lock().retain(|(id, _)| *id != instance_id);
    }
}
