//! Termination signal handling for the shell process.

use std::io;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// Signals that ask the shell to quit.
const TERMINATION_SIGNALS: [(i32, &str); 4] = [
    (SIGTERM, "SIGTERM"),
    (SIGINT, "SIGINT"),
    (SIGQUIT, "SIGQUIT"),
    (SIGHUP, "SIGHUP"),
];

/// Source of the request to quit the shell.
pub trait ShutdownSignal: Send + Sync {
    /// Blocks until the shell should quit.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when the listener cannot be installed.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Listener for the operating system's termination signals.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemShutdownSignal;

impl SystemShutdownSignal {
    /// Builds a listener for `SIGTERM`, `SIGINT`, `SIGQUIT` and `SIGHUP`.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn signal_name(signal: i32) -> &'static str {
    TERMINATION_SIGNALS
        .iter()
        .find_map(|(number, name)| (*number == signal).then_some(*name))
        .unwrap_or("unknown")
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals = Signals::new(TERMINATION_SIGNALS.map(|(number, _)| number))
            .map_err(|source| ShutdownError::Install { source })?;
        if let Some(signal) = signals.forever().next() {
            info!(
                target: PROCESS_TARGET,
                signal = signal_name(signal),
                "quit requested, terminating the shell"
            );
        }
        Ok(())
    }
}
