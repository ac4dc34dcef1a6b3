//! Shell bootstrap orchestration.

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use ytmd_config::Config;
use ytmd_host::{HostError, ServiceCollection, ServiceDescriptor, ServiceHost};

use crate::health::HealthReporter;
use crate::integrations::IntegrationManager;
use crate::services::{
    AppWindow, ConfigStore, ContentView, MemoryStore, PlayerStateStore, ShortcutManager,
    ShortcutRegistrar, StateManager, WatchDog, WindowManager, YtmViewManager,
};
use crate::shell::Shell;
use crate::telemetry::{self, TelemetryError};

const BOOTSTRAP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bootstrap");

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the shell configuration.
    ///
    /// # Errors
    ///
    /// Returns the aggregated loader error when any layer is invalid.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader returning a configuration resolved earlier.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already resolved configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The service graph could not be built.
    #[error("failed to build the service host: {source}")]
    Services {
        /// Graph or construction error.
        #[source]
        source: HostError,
    },
}

/// Platform collaborators handed to the shell.
pub struct Collaborators {
    /// Main application window.
    pub main_window: Arc<dyn AppWindow>,
    /// Web view hosting the player.
    pub view: Arc<dyn ContentView>,
    /// Global shortcut registry.
    pub shortcuts: Arc<dyn ShortcutRegistrar>,
    /// Stored settings merged over the schema defaults.
    pub settings: Option<Value>,
}

/// Bootstraps the shell using the supplied collaborators.
///
/// # Errors
///
/// Returns [`BootstrapError`] when configuration, telemetry, or the service
/// graph fails. Each failure is reported before it is returned.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    collaborators: Collaborators,
) -> Result<Shell, BootstrapError> {
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    match telemetry::initialise(&config) {
        Ok(handle) if !handle.installed_now() => debug!(
            target: BOOTSTRAP_TARGET,
            format = %handle.format(),
            "keeping the telemetry subscriber already installed"
        ),
        Ok(_) => {}
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    }

    let Collaborators {
        main_window,
        view,
        shortcuts,
        settings,
    } = collaborators;

    let host = match build_host(&config, Arc::clone(&reporter), shortcuts, settings) {
        Ok(host) => host,
        Err(source) => {
            let error = BootstrapError::Services { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    reporter.bootstrap_succeeded(&config, &host.service_names());
    Ok(Shell::new(config, host, reporter, main_window, view))
}

pub(crate) fn build_host(
    config: &Config,
    reporter: Arc<dyn HealthReporter>,
    shortcuts: Arc<dyn ShortcutRegistrar>,
    settings: Option<Value>,
) -> Result<ServiceHost, HostError> {
    let threshold = config.state_write_threshold();
    let interval = config.state_flush_interval();

    let mut collection = ServiceCollection::new();
    collection.add_services([
        ServiceDescriptor::of_default::<WatchDog>(),
        ServiceDescriptor::of_default::<WindowManager>(),
        ServiceDescriptor::of::<ConfigStore, _>(move |_| ConfigStore::new(settings)),
        ServiceDescriptor::of_default::<MemoryStore>(),
        ServiceDescriptor::of_default::<PlayerStateStore>(),
        ServiceDescriptor::of_default::<YtmViewManager>(),
        ServiceDescriptor::of::<StateManager, _>(move |_| StateManager::new(threshold, interval)),
        ServiceDescriptor::of::<ShortcutManager, _>(move |_| ShortcutManager::new(shortcuts)),
        ServiceDescriptor::of::<IntegrationManager, _>(move |host| {
            IntegrationManager::new(host, reporter)
        }),
    ])?;
    ServiceHost::new(collection)
}
