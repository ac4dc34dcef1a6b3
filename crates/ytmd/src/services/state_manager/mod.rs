//! Debounced write-back of window and session state.
//!
//! Window state changes far more often than it needs to reach the settings
//! store. Updates are buffered and merged into the `state` section either
//! once enough of them accumulate or once the flush interval passes without
//! a write. A crash report stops all further writes so a corrupted renderer
//! cannot clobber the last good state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use once_cell::sync::OnceCell;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use ytmd_config::{DEFAULT_STATE_FLUSH_INTERVAL_SECS, DEFAULT_STATE_WRITE_THRESHOLD};
use ytmd_host::{
    InitializationGuard, Service, ServiceContext, ServiceDefinition, ServiceError, Subscription,
};

use crate::services::{ConfigStore, WatchDog};

const STATE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::state_manager");
const STATE_SECTION: &str = "state";

#[derive(Debug, Default)]
struct StateBuffer {
    current: Map<String, Value>,
    stale: bool,
    updates: u32,
    last_update: Option<Instant>,
}

/// Service buffering writes to the `state` settings section.
pub struct StateManager {
    threshold: u32,
    interval: Duration,
    buffer: Mutex<StateBuffer>,
    panicked: Arc<AtomicBool>,
    config: OnceCell<Arc<ConfigStore>>,
    crash_subscription: Mutex<Option<Subscription>>,
    guard: InitializationGuard,
}

impl StateManager {
    /// Builds a manager that writes after `threshold` buffered updates or
    /// `interval` without a write.
    #[must_use]
    pub fn new(threshold: u32, interval: Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            interval,
            buffer: Mutex::new(StateBuffer::default()),
            panicked: Arc::new(AtomicBool::new(false)),
            config: OnceCell::new(),
            crash_subscription: Mutex::new(None),
            guard: InitializationGuard::new(),
        }
    }

    /// Merges `partial` into the buffered state.
    ///
    /// Returns `true` when the merge changed the state. Updates are ignored
    /// before initialisation and after a crash.
    pub fn update_state(&self, partial: Map<String, Value>) -> bool {
        if self.is_panicked() || !self.guard.is_initialized() {
            return false;
        }
        let flush_now = {
            let mut buffer = self.lock();
            let mut next = buffer.current.clone();
            next.extend(partial);
            if next == buffer.current {
                return false;
            }
            buffer.current = next;
            buffer.stale = true;
            buffer.updates = buffer.updates.saturating_add(1);
            buffer.last_update = Some(Instant::now());
            buffer.updates >= self.threshold
        };
        if flush_now {
            debug!(
                target: STATE_TARGET,
                threshold = self.threshold,
                "state update threshold reached"
            );
            self.write();
        }
        true
    }

    /// Writes buffered state when the flush interval elapsed since the last
    /// update. Returns `true` when a write happened.
    pub fn flush_if_due(&self, now: Instant) -> bool {
        let due = {
            let buffer = self.lock();
            buffer.stale
                && buffer
                    .last_update
                    .is_some_and(|last| now.saturating_duration_since(last) >= self.interval)
        };
        due && self.write()
    }

    /// Writes buffered state immediately.
    pub fn force_write(&self) -> bool {
        if !self.guard.is_initialized() {
            return false;
        }
        self.write()
    }

    /// Buffered state.
    #[must_use]
    pub fn current_state(&self) -> Map<String, Value> {
        self.lock().current.clone()
    }

    /// Returns `true` while buffered state has not been written.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.lock().stale
    }

    /// Returns `true` once a crash stopped all writes.
    #[must_use]
    pub fn is_panicked(&self) -> bool {
        self.panicked.load(Ordering::Acquire)
    }

    fn write(&self) -> bool {
        if self.is_panicked() {
            return false;
        }
        let Some(config) = self.config.get() else {
            return false;
        };
        let snapshot = {
            let buffer = self.lock();
            if !buffer.stale {
                return false;
            }
            buffer.current.clone()
        };
        match config.set(STATE_SECTION, Value::Object(snapshot)) {
            Ok(()) => {
                let mut buffer = self.lock();
                buffer.stale = false;
                buffer.updates = 0;
                buffer.last_update = None;
                debug!(target: STATE_TARGET, "window state written");
                true
            }
            Err(error) => {
                warn!(target: STATE_TARGET, error = %error, "failed to write window state");
                false
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StateBuffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new(
            DEFAULT_STATE_WRITE_THRESHOLD,
            Duration::from_secs(DEFAULT_STATE_FLUSH_INTERVAL_SECS),
        )
    }
}

impl Service for StateManager {
    fn on_pre_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        self.guard.mark(Self::NAME)
    }

    fn on_post_initialized(&self, context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        let config = context.get_dependency::<ConfigStore>()?;
        let watchdog = context.get_dependency::<WatchDog>()?;

        if let Some(Value::Object(state)) = config.get(STATE_SECTION) {
            self.lock().current = state;
        }
        if self.config.set(config).is_err() {
            return Err(ServiceError::AlreadyInitialized { service: Self::NAME });
        }

        let panicked = Arc::clone(&self.panicked);
        let subscription = watchdog.on_crash(move |report| {
            warn!(
                target: STATE_TARGET,
                reason = %report.reason,
                "crash reported; state writes stopped"
            );
            panicked.store(true, Ordering::Release);
        });
        *self
            .crash_subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(subscription);
        Ok(())
    }

    fn on_terminated(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        self.force_write();
        Ok(())
    }
}

impl ServiceDefinition for StateManager {
    const NAME: &'static str = "StateManager";
    const DEPENDENCIES: &'static [&'static str] = &[ConfigStore::NAME, WatchDog::NAME];
}

#[cfg(test)]
mod tests;
