//! Reconciles integrations against the settings tree.
//!
//! The manager owns every integration and decides when each one is enabled,
//! disabled, or restarted. Settings notifications arrive synchronously from
//! whichever caller wrote the value, so they are queued in emission order and
//! applied one pass at a time by a single consumer. Every pass holds the
//! integration set for its whole duration.
//!
//! The enabled set is derived from each integration's flag, so dropping a
//! pass while a hook is suspended never leaves the two out of step.

use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::OnceCell;
use serde_json::Value;
use strum::Display;
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tracing::{debug, info, warn};
use ytmd_host::{
    HostHandle, InitializationGuard, Service, ServiceContext, ServiceDefinition, ServiceError,
    Subscribers, Subscription,
};

use crate::health::HealthReporter;
use crate::integrations::{Integration, IntegrationContext, IntegrationError, IntegrationFactory};
use crate::services::{
    ConfigStore, PlayerStateStore, SettingsChange, YtmViewManager, is_truthy, lookup,
};

const MANAGER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::integrations");

/// Application hooks forwarded to the manager by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ManagerHook {
    /// Before the application is ready; runs every `on_setup`.
    AppBeforeReady,
    /// Once the application is ready; runs the first reconciliation pass.
    AppReady,
}

/// Payload of the `enable-error` event.
#[derive(Debug, Clone)]
pub struct EnableFailure {
    /// Integration that failed to enable.
    pub integration: &'static str,
    /// Error returned by `on_enabled`.
    pub error: Arc<IntegrationError>,
}

/// Errors raised by the integration manager.
#[derive(Debug, Error)]
pub enum IntegrationManagerError {
    /// An integration failed during `on_setup`.
    #[error("integration '{integration}' failed to set up: {source}")]
    Setup {
        /// Integration that failed.
        integration: &'static str,
        /// Error returned by `on_setup`.
        #[source]
        source: IntegrationError,
    },
    /// A hook arrived in the wrong phase.
    #[error("hook '{hook}' called out of order")]
    HookOutOfOrder {
        /// Offending hook.
        hook: ManagerHook,
    },
    /// Integrations were created after setup already ran.
    #[error("integrations can only be created before 'app-before-ready'")]
    CreationClosed,
    /// The manager has not been post-initialised by the host.
    #[error("integration manager is not wired to the settings store")]
    NotWired,
    /// The change loop was started before the first pass.
    #[error("integration manager is not ready")]
    NotReady,
    /// The settings notification queue closed.
    #[error("settings change queue closed")]
    QueueClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Created,
    SetUp,
    Ready,
    Stopped,
}

struct ManagedIntegration {
    integration: Box<dyn Integration>,
    enabled: bool,
}

impl ManagedIntegration {
    const fn new(integration: Box<dyn Integration>) -> Self {
        Self {
            integration,
            enabled: false,
        }
    }

    fn name(&self) -> &'static str {
        self.integration.name()
    }

    fn enable(&mut self) -> Result<(), IntegrationError> {
        self.enabled = true;
        let result = self.integration.on_enabled();
        if result.is_err() {
            self.enabled = false;
        }
        result
    }

    async fn disable(&mut self) -> Result<(), IntegrationError> {
        self.enabled = false;
        self.integration.on_disabled().await
    }
}

struct ManagerState {
    integrations: Vec<ManagedIntegration>,
    phase: Phase,
}

/// Service owning every integration.
pub struct IntegrationManager {
    host: HostHandle,
    reporter: Arc<dyn HealthReporter>,
    state: AsyncMutex<ManagerState>,
    sender: mpsc::UnboundedSender<SettingsChange>,
    receiver: AsyncMutex<mpsc::UnboundedReceiver<SettingsChange>>,
    enable_errors: Subscribers<EnableFailure>,
    config: OnceCell<Arc<ConfigStore>>,
    subscription: Mutex<Option<Subscription>>,
    guard: InitializationGuard,
}

impl IntegrationManager {
    /// Builds a manager bound to `host`.
    #[must_use]
    pub fn new(host: HostHandle, reporter: Arc<dyn HealthReporter>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            host,
            reporter,
            state: AsyncMutex::new(ManagerState {
                integrations: Vec::new(),
                phase: Phase::Created,
            }),
            sender,
            receiver: AsyncMutex::new(receiver),
            enable_errors: Subscribers::new(),
            config: OnceCell::new(),
            subscription: Mutex::new(None),
            guard: InitializationGuard::new(),
        }
    }

    /// Instantiates one integration per factory, preserving order.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrationManagerError::CreationClosed`] once setup ran.
    pub async fn create_integrations(
        &self,
        factories: Vec<IntegrationFactory>,
    ) -> Result<(), IntegrationManagerError> {
        let mut state = self.state.lock().await;
        if state.phase != Phase::Created {
            return Err(IntegrationManagerError::CreationClosed);
        }
        let context = IntegrationContext::new(self.host.clone());
        for factory in factories {
            let integration = factory(context.clone());
            debug!(target: MANAGER_TARGET, integration = integration.name(), "created integration");
            state.integrations.push(ManagedIntegration::new(integration));
        }
        Ok(())
    }

    /// Runs an application hook.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrationManagerError::Setup`] when an integration fails
    /// to set up, [`IntegrationManagerError::NotWired`] when `AppReady`
    /// arrives before post-initialisation, and
    /// [`IntegrationManagerError::HookOutOfOrder`] for hooks in the wrong
    /// phase.
    pub async fn run_hook(&self, hook: ManagerHook) -> Result<(), IntegrationManagerError> {
        let mut receiver = self.receiver.lock().await;
        let mut state = self.state.lock().await;
        match (hook, state.phase) {
            (ManagerHook::AppBeforeReady, Phase::Created) => {
                for entry in &mut state.integrations {
                    entry.integration.on_setup().map_err(|source| {
                        IntegrationManagerError::Setup {
                            integration: entry.name(),
                            source,
                        }
                    })?;
                }
                state.phase = Phase::SetUp;
                Ok(())
            }
            (ManagerHook::AppReady, Phase::SetUp) => {
                let config = self.config.get().ok_or(IntegrationManagerError::NotWired)?;
                let (snapshot, superseded) = config.settled(|tree| {
                    let mut discarded = 0_usize;
                    while receiver.try_recv().is_ok() {
                        discarded += 1;
                    }
                    (Arc::clone(tree), discarded)
                });
                if superseded > 0 {
                    debug!(
                        target: MANAGER_TARGET,
                        superseded,
                        "settings changed before ready; the ready pass reads the live tree"
                    );
                }
                self.reconcile(&mut state, &snapshot, None).await;
                state.phase = Phase::Ready;
                info!(target: MANAGER_TARGET, "integrations ready");
                Ok(())
            }
            _ => Err(IntegrationManagerError::HookOutOfOrder { hook }),
        }
    }

    /// Applies every queued settings change, one pass each, and returns the
    /// number of passes run.
    ///
    /// Changes made before the `AppReady` pass are already reflected by that
    /// pass and are discarded by it. Waits while [`Self::run_change_loop`]
    /// owns the queue.
    pub async fn reconcile_pending(&self) -> usize {
        let mut receiver = self.receiver.lock().await;
        let mut passes = 0;
        loop {
            let mut state = self.state.lock().await;
            if state.phase != Phase::Ready {
                return passes;
            }
            let Ok(change) = receiver.try_recv() else {
                return passes;
            };
            self.reconcile(&mut state, &change.new, Some(&change)).await;
            passes += 1;
        }
    }

    /// Applies settings changes as they arrive, one pass at a time.
    ///
    /// The future may be dropped at any await point. An integration whose
    /// `on_disabled` was interrupted stays disabled and is not disabled again.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrationManagerError::NotReady`] before the `AppReady`
    /// pass and [`IntegrationManagerError::QueueClosed`] if the queue ends.
    pub async fn run_change_loop(&self) -> Result<(), IntegrationManagerError> {
        if self.state.lock().await.phase != Phase::Ready {
            return Err(IntegrationManagerError::NotReady);
        }
        let mut receiver = self.receiver.lock().await;
        while let Some(change) = receiver.recv().await {
            let mut state = self.state.lock().await;
            if state.phase != Phase::Ready {
                continue;
            }
            self.reconcile(&mut state, &change.new, Some(&change)).await;
        }
        Err(IntegrationManagerError::QueueClosed)
    }

    /// Disables every enabled integration and stops reconciling.
    pub async fn disable_all(&self) {
        let mut state = self.state.lock().await;
        for entry in &mut state.integrations {
            if entry.enabled {
                self.disable(entry).await;
            }
        }
        state.phase = Phase::Stopped;
    }

    /// Subscribes to `enable-error` events.
    #[must_use = "dropping the subscription removes the listener"]
    pub fn on_enable_error<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&EnableFailure) + Send + Sync + 'static,
    {
        self.enable_errors.subscribe(listener)
    }

    /// Names of every integration in registration order.
    pub async fn integration_names(&self) -> Vec<&'static str> {
        self.state
            .lock()
            .await
            .integrations
            .iter()
            .map(ManagedIntegration::name)
            .collect()
    }

    /// Names of the integrations in the enabled set, in registration order.
    pub async fn enabled_integrations(&self) -> Vec<&'static str> {
        self.state
            .lock()
            .await
            .integrations
            .iter()
            .filter(|entry| entry.enabled)
            .map(ManagedIntegration::name)
            .collect()
    }

    /// Enabled flag of the integration called `name`, if it exists.
    pub async fn is_enabled(&self, name: &str) -> Option<bool> {
        self.state
            .lock()
            .await
            .integrations
            .iter()
            .find(|entry| entry.name() == name)
            .map(|entry| entry.enabled)
    }

    async fn reconcile(
        &self,
        state: &mut ManagerState,
        snapshot: &Value,
        change: Option<&SettingsChange>,
    ) {
        for entry in &mut state.integrations {
            let should_enable = is_truthy(lookup(snapshot, entry.integration.gating_key()));
            match (entry.enabled, should_enable) {
                (false, true) => self.enable(entry),
                (true, false) => self.disable(entry).await,
                (true, true) => {
                    let restart = change.is_some_and(|diff| {
                        entry
                            .integration
                            .dependent_keys()
                            .iter()
                            .any(|key| diff.changed(key))
                    });
                    if restart {
                        self.restart(entry).await;
                    }
                }
                (false, false) => {}
            }
        }
    }

    fn enable(&self, entry: &mut ManagedIntegration) {
        match entry.enable() {
            Ok(()) => self.reporter.integration_enabled(entry.name()),
            Err(error) => self.enable_failed(entry, error),
        }
    }

    async fn disable(&self, entry: &mut ManagedIntegration) {
        if let Err(error) = entry.disable().await {
            warn!(
                target: MANAGER_TARGET,
                integration = entry.name(),
                error = %error,
                "integration failed to disable cleanly"
            );
        }
        self.reporter.integration_disabled(entry.name());
    }

    async fn restart(&self, entry: &mut ManagedIntegration) {
        if let Err(error) = entry.disable().await {
            warn!(
                target: MANAGER_TARGET,
                integration = entry.name(),
                error = %error,
                "integration failed to disable cleanly before restart"
            );
        }
        match entry.enable() {
            Ok(()) => self.reporter.integration_restarted(entry.name()),
            Err(error) => self.enable_failed(entry, error),
        }
    }

    fn enable_failed(&self, entry: &ManagedIntegration, error: IntegrationError) {
        self.enable_errors.emit(&EnableFailure {
            integration: entry.name(),
            error: Arc::new(error),
        });
    }
}

impl Service for IntegrationManager {
    fn on_pre_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        self.guard.mark(Self::NAME)
    }

    fn on_post_initialized(&self, context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        let config = context.get_dependency::<ConfigStore>()?;
        let sender = self.sender.clone();
        let subscription = config.on_did_any_change(move |change| {
            if sender.send(change.clone()).is_err() {
                warn!(target: MANAGER_TARGET, "settings change dropped; queue closed");
            }
        });
        if self.config.set(config).is_err() {
            return Err(ServiceError::AlreadyInitialized { service: Self::NAME });
        }
        *self.subscription.lock().unwrap_or_else(PoisonError::into_inner) = Some(subscription);
        Ok(())
    }

    fn on_terminated(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        self.subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}

impl ServiceDefinition for IntegrationManager {
    const NAME: &'static str = "IntegrationManager";
    const DEPENDENCIES: &'static [&'static str] = &[
        ConfigStore::NAME,
        YtmViewManager::NAME,
        PlayerStateStore::NAME,
    ];
}
