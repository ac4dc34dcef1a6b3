//! Application shell driving the service host through its lifecycle.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info};
use ytmd_config::Config;
use ytmd_host::{HostError, ServiceDefinition, ServiceHost, Subscription};

use crate::health::HealthReporter;
use crate::integrations::{
    IntegrationFactory, IntegrationManager, IntegrationManagerError, ManagerHook,
};
use crate::protocol::ProtocolAction;
use crate::services::{
    AppWindow, ContentView, MAIN_WINDOW, StateManager, ViewError, WindowManager, YtmViewManager,
};

const SHELL_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::shell");

/// Errors raised while driving the shell.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The service host rejected a lifecycle step or lookup.
    #[error(transparent)]
    Lifecycle(#[from] HostError),
    /// The integration manager rejected a hook.
    #[error(transparent)]
    Integrations(#[from] IntegrationManagerError),
    /// The player view could not carry out a request.
    #[error(transparent)]
    View(#[from] ViewError),
}

/// Bootstrapped shell owning the service host.
pub struct Shell {
    config: Config,
    host: ServiceHost,
    reporter: Arc<dyn HealthReporter>,
    main_window: Arc<dyn AppWindow>,
    view: Arc<dyn ContentView>,
    enable_errors: Option<Subscription>,
}

impl Shell {
    pub(crate) fn new(
        config: Config,
        host: ServiceHost,
        reporter: Arc<dyn HealthReporter>,
        main_window: Arc<dyn AppWindow>,
        view: Arc<dyn ContentView>,
    ) -> Self {
        Self {
            config,
            host,
            reporter,
            main_window,
            view,
            enable_errors: None,
        }
    }

    /// Resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Service host.
    #[must_use]
    pub const fn host(&self) -> &ServiceHost {
        &self.host
    }

    /// Hosted service `T`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when `T` is not registered.
    pub fn service<T: ServiceDefinition>(&self) -> Result<Arc<T>, HostError> {
        self.host.get_service::<T>()
    }

    /// Integration manager.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the manager is not registered.
    pub fn integrations(&self) -> Result<Arc<IntegrationManager>, HostError> {
        self.service::<IntegrationManager>()
    }

    /// Pre-initialises services, creates `integrations`, and runs their
    /// setup.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError`] when a service hook or integration setup fails.
    pub async fn before_ready(
        &mut self,
        integrations: Vec<IntegrationFactory>,
    ) -> Result<(), ShellError> {
        self.advance()?;
        let manager = self.integrations()?;
        manager.create_integrations(integrations).await?;

        let reporter = Arc::clone(&self.reporter);
        self.enable_errors = Some(manager.on_enable_error(move |failure| {
            reporter.integration_enable_failed(failure.integration, &failure.error);
        }));
        manager.run_hook(ManagerHook::AppBeforeReady).await?;
        Ok(())
    }

    /// Initialises services, opens the main window and player view, then
    /// enables integrations.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError`] when a service hook or manager hook fails.
    pub async fn ready(&mut self) -> Result<(), ShellError> {
        self.advance()?;
        self.service::<WindowManager>()?
            .register_window(MAIN_WINDOW, Arc::clone(&self.main_window));
        self.service::<YtmViewManager>()?
            .attach_view(Arc::clone(&self.view));
        self.advance()?;
        self.integrations()?.run_hook(ManagerHook::AppReady).await?;
        info!(target: SHELL_TARGET, "shell ready");
        Ok(())
    }

    /// Disables integrations and terminates every service.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError`] when a terminate hook fails.
    pub async fn terminate(&mut self) -> Result<(), ShellError> {
        self.integrations()?.disable_all().await;
        self.enable_errors.take();
        self.advance()?;
        info!(target: SHELL_TARGET, "shell terminated");
        Ok(())
    }

    /// Handles a second launch of the application.
    ///
    /// Ignored while the host is not initialised. Otherwise focuses the main
    /// window and follows a deep link passed as the last argument. Returns
    /// `true` when the launch was handled.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError`] when the deep link cannot be delivered.
    pub async fn handle_second_instance(&self, args: &[String]) -> Result<bool, ShellError> {
        if !self.host.initialized() {
            debug!(target: SHELL_TARGET, "second instance ignored during start-up");
            return Ok(false);
        }
        if let Some(window) = self.service::<WindowManager>()?.get_window(MAIN_WINDOW) {
            window.show_and_focus();
        }
        if let Some(url) = args.last() {
            self.handle_protocol(url).await?;
        }
        Ok(true)
    }

    /// Follows a `ytmd://` deep link. Returns `true` when a command was sent.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError`] when the player view rejects the command.
    pub async fn handle_protocol(&self, url: &str) -> Result<bool, ShellError> {
        if !self.host.initialized() {
            return Ok(false);
        }
        let Some(action) = ProtocolAction::parse(url) else {
            debug!(target: SHELL_TARGET, url, "ignoring unrecognised protocol url");
            return Ok(false);
        };
        let view = self.service::<YtmViewManager>()?;
        if !view.is_initialized() {
            return Ok(false);
        }
        info!(target: SHELL_TARGET, url, "handling protocol url");
        view.ready().await?;
        let (command, argument) = action.remote_command();
        view.execute_remote_command(command, Some(argument))?;
        Ok(true)
    }

    /// Writes buffered window state when its flush interval elapsed.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the state manager is not registered.
    pub fn flush_state(&self) -> Result<bool, HostError> {
        Ok(self.service::<StateManager>()?.flush_if_due(Instant::now()))
    }

    fn advance(&mut self) -> Result<(), ShellError> {
        let stage = self.host.run_next_lifecycle()?;
        self.reporter.lifecycle_advanced(stage);
        Ok(())
    }
}
