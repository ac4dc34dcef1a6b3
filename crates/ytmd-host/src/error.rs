//! Errors raised by the service kernel.
//!
//! Every variant describes a programming or assembly mistake. Callers are
//! expected to abort startup when they observe one; there is no recovery path
//! inside the kernel itself.

use thiserror::Error;

use crate::LifecycleStage;

/// Errors arising while assembling, driving, or querying a service host.
#[derive(Debug, Error)]
pub enum HostError {
    /// A service with the same name was already registered.
    #[error("service '{name}' is already registered")]
    DuplicateService {
        /// Name that collided.
        name: &'static str,
    },

    /// A service declared a dependency that is not part of the collection.
    #[error("service '{service}' depends on '{dependency}' but it is not in the service collection")]
    UnknownDependency {
        /// Service declaring the dependency.
        service: &'static str,
        /// Missing dependency.
        dependency: &'static str,
    },

    /// Following a declared dependency leads back to a service in progress.
    #[error("service '{service}' depends on '{dependency}' but this would result in a circular dependency")]
    CircularDependency {
        /// Service declaring the dependency.
        service: &'static str,
        /// Dependency that closes the cycle.
        dependency: &'static str,
    },

    /// A service requested a dependency it never declared.
    #[error("service '{requester}' attempted to get dependency '{dependency}' but does not depend on it")]
    UndeclaredDependency {
        /// Service performing the lookup.
        requester: &'static str,
        /// Service that was requested.
        dependency: &'static str,
    },

    /// The requested service is not hosted.
    #[error("service '{name}' is not registered with the host")]
    ServiceNotFound {
        /// Name that was looked up.
        name: &'static str,
    },

    /// The hosted instance does not have the requested concrete type.
    #[error("service '{name}' is registered with a different concrete type")]
    TypeMismatch {
        /// Name that was looked up.
        name: &'static str,
    },

    /// The host backing a handle has already been dropped.
    #[error("the service host has been dropped")]
    HostDropped,

    /// Every lifecycle stage has already run.
    #[error("service host lifecycle already reached {stage}")]
    LifecycleExhausted {
        /// Stage the host is in.
        stage: LifecycleStage,
    },

    /// A service hook failed while the host advanced to `stage`.
    #[error("service '{service}' failed during {stage}: {source}")]
    Hook {
        /// Service whose hook failed.
        service: &'static str,
        /// Stage being entered.
        stage: LifecycleStage,
        /// Error reported by the hook.
        #[source]
        source: ServiceError,
    },
}

/// Errors reported by service lifecycle hooks.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The initialisation hook ran twice.
    #[error("service '{service}' is already initialized")]
    AlreadyInitialized {
        /// Offending service.
        service: &'static str,
    },

    /// Resolving a dependency failed inside a hook.
    #[error(transparent)]
    Dependency(#[from] Box<HostError>),

    /// Service-specific failure.
    #[error("{message}")]
    Failed {
        /// Human-readable description.
        message: String,
        /// Optional underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ServiceError {
    /// Builds a service failure without an underlying source.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            source: None,
        }
    }

    /// Builds a service failure wrapping an underlying error.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Failed {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

impl From<HostError> for ServiceError {
    fn from(error: HostError) -> Self {
        Self::Dependency(Box::new(error))
    }
}
