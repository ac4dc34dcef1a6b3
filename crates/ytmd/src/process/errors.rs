//! Error surface for launching and supervising the shell process.

use std::io;
use std::sync::Arc;

use ortho_config::OrthoError;
use thiserror::Error;
use tokio::task::JoinError;

use crate::bootstrap::BootstrapError;
use crate::shell::ShellError;

use super::shutdown::ShutdownError;

/// Errors surfaced while launching or supervising the shell.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Config {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Building the async runtime failed.
    #[error("failed to start the async runtime: {source}")]
    Runtime {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Bootstrapping the shell failed.
    #[error("shell bootstrap failed: {source}")]
    Bootstrap {
        /// Underlying bootstrap error.
        #[source]
        source: BootstrapError,
    },
    /// The running shell failed.
    #[error("shell failed: {source}")]
    Shell {
        /// Underlying shell error.
        #[source]
        source: ShellError,
    },
    /// Waiting for shutdown failed.
    #[error("failed to await shutdown signal: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[source]
        source: ShutdownError,
    },
    /// The shutdown listener task panicked or was cancelled.
    #[error("shutdown listener stopped unexpectedly: {source}")]
    Listener {
        /// Underlying join error.
        #[source]
        source: JoinError,
    },
}

impl From<Arc<OrthoError>> for LaunchError {
    fn from(source: Arc<OrthoError>) -> Self {
        Self::Config { source }
    }
}

impl From<BootstrapError> for LaunchError {
    fn from(source: BootstrapError) -> Self {
        Self::Bootstrap { source }
    }
}

impl From<ShellError> for LaunchError {
    fn from(source: ShellError) -> Self {
        Self::Shell { source }
    }
}

impl From<ShutdownError> for LaunchError {
    fn from(source: ShutdownError) -> Self {
        Self::Shutdown { source }
    }
}
