//! Live settings tree with change notifications.
//!
//! Persistence is an external concern; the store holds the tree in memory,
//! seeded from [`StoreSchema`] defaults plus any overrides supplied by the
//! shell, and notifies listeners strictly after each update is applied.

mod path;
pub mod schema;

use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info};
use ytmd_host::{
    InitializationGuard, Service, ServiceContext, ServiceDefinition, ServiceError, Subscribers,
    Subscription,
};

pub use path::{is_truthy, lookup};
pub use schema::StoreSchema;

use crate::services::WindowManager;

const CONFIG_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::config_store");

/// Channel broadcast to every window after a settings change.
pub const STATE_CHANGED_CHANNEL: &str = "configStore:stateChanged";

/// Errors raised while reading or writing settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The dotted path was empty or contained an empty segment.
    #[error("invalid settings path '{path}'")]
    InvalidPath {
        /// Offending path.
        path: String,
    },
    /// A path segment tried to descend through a non-object value.
    #[error("settings path '{path}' cannot descend into '{segment}'")]
    NotAnObject {
        /// Full path being written.
        path: String,
        /// Segment that could not be created.
        segment: String,
    },
    /// A stored value did not have the requested shape.
    #[error("settings value at '{path}' has an unexpected shape: {source}")]
    Decode {
        /// Path that was read.
        path: String,
        /// Deserialisation failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Snapshot pair delivered to change listeners.
#[derive(Debug, Clone)]
pub struct SettingsChange {
    /// Tree after the update.
    pub new: Arc<Value>,
    /// Tree before the update.
    pub old: Arc<Value>,
}

impl SettingsChange {
    /// Value at `path` after the update.
    #[must_use]
    pub fn new_value(&self, path: &str) -> Option<&Value> {
        lookup(&self.new, path)
    }

    /// Value at `path` before the update.
    #[must_use]
    pub fn old_value(&self, path: &str) -> Option<&Value> {
        lookup(&self.old, path)
    }

    /// Returns `true` when the value at `path` differs between snapshots.
    #[must_use]
    pub fn changed(&self, path: &str) -> bool {
        self.new_value(path) != self.old_value(path)
    }
}

/// Settings service.
pub struct ConfigStore {
    overrides: Option<Value>,
    tree: Mutex<Arc<Value>>,
    writes: Mutex<()>,
    changes: Subscribers<SettingsChange>,
    broadcast: Mutex<Option<Subscription>>,
    guard: InitializationGuard,
}

impl ConfigStore {
    /// Builds a store that deep-merges `overrides` over the schema defaults
    /// when it is pre-initialised.
    #[must_use]
    pub fn new(overrides: Option<Value>) -> Self {
        Self {
            overrides,
            tree: Mutex::new(Arc::new(Value::Null)),
            writes: Mutex::new(()),
            changes: Subscribers::new(),
            broadcast: Mutex::new(None),
            guard: InitializationGuard::new(),
        }
    }

    /// Current value at `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Value> {
        lookup(&self.current(), path).cloned()
    }

    /// Current value at `path`, decoded into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Decode`] when the stored value cannot be
    /// decoded. Missing and `null` values yield `Ok(None)`.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, SettingsError> {
        match self.get(path) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| SettingsError::Decode {
                    path: path.to_owned(),
                    source,
                }),
        }
    }

    /// Returns `true` when the value at `path` is truthy.
    #[must_use]
    pub fn is_truthy(&self, path: &str) -> bool {
        is_truthy(lookup(&self.current(), path))
    }

    /// Whole settings tree.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Value> {
        self.current()
    }

    /// Runs `read` against the whole tree while no write is in flight.
    ///
    /// Every change applied before `read` runs has already been delivered to
    /// listeners, and none is applied until it returns.
    pub fn settled<R>(&self, read: impl FnOnce(&Arc<Value>) -> R) -> R {
        let _writing = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        read(&self.current())
    }

    /// Stores `value` at `path` and notifies listeners.
    ///
    /// Writing a value equal to the current one is a no-op and emits nothing.
    /// Writes are serialized with their notifications, so listeners observe
    /// changes in the order they were applied. Listeners must not write
    /// settings themselves.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when `path` is malformed or traverses a
    /// non-object value.
    pub fn set(&self, path: &str, value: Value) -> Result<(), SettingsError> {
        let _writing = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        let change = {
            let mut tree = self.tree.lock().unwrap_or_else(PoisonError::into_inner);
            if lookup(&tree, path) == Some(&value) {
                return Ok(());
            }
            let old = Arc::clone(&tree);
            let mut next = Value::clone(&old);
            path::assign(&mut next, path, value)?;
            let new = Arc::new(next);
            *tree = Arc::clone(&new);
            SettingsChange { new, old }
        };
        debug!(target: CONFIG_TARGET, path, "settings value changed");
        self.changes.emit(&change);
        Ok(())
    }

    /// Subscribes to every change of the tree.
    #[must_use = "dropping the subscription removes the listener"]
    pub fn on_did_any_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SettingsChange) + Send + Sync + 'static,
    {
        self.changes.subscribe(listener)
    }

    /// Subscribes to changes of the subtree at `section`.
    ///
    /// The listener receives the new and old subtree and only runs when they
    /// differ.
    #[must_use = "dropping the subscription removes the listener"]
    pub fn on_did_change<F>(&self, section: &str, listener: F) -> Subscription
    where
        F: Fn(Option<&Value>, Option<&Value>) + Send + Sync + 'static,
    {
        let section_path = section.to_owned();
        self.changes.subscribe(move |change: &SettingsChange| {
            let new = change.new_value(&section_path);
            let old = change.old_value(&section_path);
            if new != old {
                listener(new, old);
            }
        })
    }

    fn current(&self) -> Arc<Value> {
        Arc::clone(&self.tree.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Service for ConfigStore {
    fn on_pre_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        let mut tree = StoreSchema::default_tree();
        if let Some(overrides) = self.overrides.clone() {
            path::deep_merge(&mut tree, overrides);
        }
        *self.tree.lock().unwrap_or_else(PoisonError::into_inner) = Arc::new(tree);
        if self.is_truthy("general.disableHardwareAcceleration") {
            info!(target: CONFIG_TARGET, "hardware acceleration disabled");
        }
        if self.is_truthy("playback.enableSpeakerFill") {
            info!(target: CONFIG_TARGET, "speaker fill enabled");
        }
        Ok(())
    }

    fn on_initialized(&self, context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        self.guard.mark(Self::NAME)?;
        let windows = context.get_dependency::<WindowManager>()?;
        let subscription = self.on_did_any_change(move |change| {
            windows.broadcast(
                STATE_CHANGED_CHANNEL,
                &json!([change.new.as_ref(), change.old.as_ref()]),
            );
        });
        *self.broadcast.lock().unwrap_or_else(PoisonError::into_inner) = Some(subscription);
        info!(target: CONFIG_TARGET, "config store initialized");
        Ok(())
    }

    fn on_post_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_terminated(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        self.broadcast
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}

impl ServiceDefinition for ConfigStore {
    const NAME: &'static str = "ConfigStore";
    const DEPENDENCIES: &'static [&'static str] = &[WindowManager::NAME];
}
