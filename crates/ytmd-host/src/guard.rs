//! One-shot initialisation guard for service hooks.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::ServiceError;

/// Flag set by a service's `on_initialized` hook.
///
/// A second call to [`InitializationGuard::mark`] fails loudly instead of
/// silently re-running initialisation.
#[derive(Debug, Default)]
pub struct InitializationGuard {
    initialized: AtomicBool,
}

impl InitializationGuard {
    /// Builds an unset guard.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            initialized: AtomicBool::new(false),
        }
    }

    /// Marks `service` as initialised.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::AlreadyInitialized`] when the guard was
    /// already set.
    pub fn mark(&self, service: &'static str) -> Result<(), ServiceError> {
        if self.initialized.swap(true, Ordering::AcqRel) {
            return Err(ServiceError::AlreadyInitialized { service });
        }
        Ok(())
    }

    /// Returns `true` once [`InitializationGuard::mark`] succeeded.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }
}
