//! Volatile key/value state shared with renderers.

use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::OnceCell;
use serde_json::{Map, Value, json};
use ytmd_host::{
    Service, ServiceContext, ServiceDefinition, ServiceError, Subscribers, Subscription,
};

use crate::services::WindowManager;

/// Channel broadcast to every window after a memory-store change.
pub const MEMORY_CHANGED_CHANNEL: &str = "memoryStore:stateChanged";

/// Snapshot pair delivered to memory-store listeners.
#[derive(Debug, Clone)]
pub struct MemoryChange {
    /// State after the update.
    pub new: Arc<Map<String, Value>>,
    /// State before the update.
    pub old: Arc<Map<String, Value>>,
}

/// Service holding state that never reaches disk.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<Arc<Map<String, Value>>>,
    changes: Subscribers<MemoryChange>,
    windows: OnceCell<Arc<WindowManager>>,
}

impl MemoryStore {
    /// Value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.current().get(key).cloned()
    }

    /// Boolean stored under `key`; anything else reads as `false`.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).and_then(|value| value.as_bool()).unwrap_or(false)
    }

    /// Stores `value` under `key` and notifies listeners and windows.
    pub fn set(&self, key: &str, value: Value) {
        let change = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let old = Arc::clone(&state);
            let mut next = Map::clone(&old);
            next.insert(key.to_owned(), value);
            let new = Arc::new(next);
            *state = Arc::clone(&new);
            MemoryChange { new, old }
        };
        self.changes.emit(&change);
        if let Some(windows) = self.windows.get() {
            windows.broadcast(
                MEMORY_CHANGED_CHANNEL,
                &json!([change.new.as_ref(), change.old.as_ref()]),
            );
        }
    }

    /// Subscribes to every state change.
    #[must_use = "dropping the subscription removes the listener"]
    pub fn on_state_changed<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&MemoryChange) + Send + Sync + 'static,
    {
        self.changes.subscribe(listener)
    }

    fn current(&self) -> Arc<Map<String, Value>> {
        Arc::clone(&self.state.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Service for MemoryStore {
    fn on_pre_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_initialized(&self, context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        let windows = context.get_dependency::<WindowManager>()?;
        if self.windows.set(windows).is_err() {
            return Err(ServiceError::AlreadyInitialized { service: Self::NAME });
        }
        Ok(())
    }

    fn on_post_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_terminated(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }
}

impl ServiceDefinition for MemoryStore {
    const NAME: &'static str = "MemoryStore";
    const DEPENDENCIES: &'static [&'static str] = &[WindowManager::NAME];
}
