use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;
use ytmd_host::HostError;

use crate::integrations::PresenceError;
use crate::services::{SettingsError, ViewError};

/// Errors raised by integration hooks.
#[derive(Debug, Error)]
pub enum IntegrationError {
    /// A hosted service could not be resolved.
    #[error("integration could not reach a service: {0}")]
    Service(#[from] HostError),
    /// The content view rejected an operation.
    #[error(transparent)]
    View(#[from] ViewError),
    /// A settings value could not be read.
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// The presence client failed.
    #[error(transparent)]
    Presence(#[from] PresenceError),
    /// A file referenced by the settings could not be read.
    #[error("failed to read '{path}': {source}")]
    Io {
        /// File being read.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Integration-specific failure.
    #[error("{0}")]
    Other(String),
}
