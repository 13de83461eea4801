use indexmap::IndexMap;
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};

/// Handler for a host-pushed event; receives the event's `args`.
pub type EventHandler = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// Event handlers keyed by function name, in registration order.
#[derive(Default)]
pub struct EventHandlers {
    handlers: RwLock<IndexMap<String, EventHandler>>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `name`, replacing any previous one. Returns whether one was replaced.
    pub fn register(&self, name: impl Into<String>, handler: EventHandler) -> bool {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), handler)
            .is_some()
    }

    pub fn remove(&self, name: &str) -> bool {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .shift_remove(name)
            .is_some()
    }

    /// Run the handler for `name`, if any. The handler runs outside the lock
    /// so it may register or remove handlers itself.
    pub fn dispatch(&self, name: &str, args: &[Value]) -> bool {
        let handler = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned();

        match handler {
            Some(handler) => {
                handler(args);
                true
            }
            None => false,
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl std::fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHandlers")
            .field("names", &self.names())
            .finish()
    }
}
