//! Crash reporting hub for renderer and child processes.

use tracing::error;
use ytmd_host::{
    Service, ServiceContext, ServiceDefinition, ServiceError, Subscribers, Subscription,
};

const WATCHDOG_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::watchdog");

/// Crash notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashReport {
    /// Human-readable crash reason.
    pub reason: String,
}

/// Service that fans out crash notifications.
#[derive(Default)]
pub struct WatchDog {
    crashes: Subscribers<CrashReport>,
}

impl WatchDog {
    /// Subscribes to crash notifications.
    #[must_use = "dropping the subscription removes the listener"]
    pub fn on_crash<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&CrashReport) + Send + Sync + 'static,
    {
        self.crashes.subscribe(listener)
    }

    /// Records a crash and notifies listeners.
    pub fn report_crash(&self, reason: impl Into<String>) {
        let report = CrashReport {
            reason: reason.into(),
        };
        error!(target: WATCHDOG_TARGET, reason = %report.reason, "crash reported");
        self.crashes.emit(&report);
    }
}

impl Service for WatchDog {
    fn on_pre_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_post_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_terminated(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }
}

impl ServiceDefinition for WatchDog {
    const NAME: &'static str = "WatchDog";
}
