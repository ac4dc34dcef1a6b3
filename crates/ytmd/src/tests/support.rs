//! Shared fixtures for the shell's unit and behavioural suites.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::runtime::{Builder, Runtime};
use ytmd_config::Config;
use ytmd_host::{HostHandle, LifecycleStage, ServiceDefinition, ServiceHost};

use crate::bootstrap::{BootstrapError, build_host};
use crate::headless::HeadlessShortcutRegistrar;
use crate::health::HealthReporter;
use crate::integrations::{
    Integration, IntegrationContext, IntegrationError, IntegrationFactory, IntegrationManager,
};
use crate::services::{
    AppWindow, ConfigStore, ContentView, CssKey, MAIN_WINDOW, MemoryStore, PlayerStateStore,
    ShortcutRegistrar, ViewError, WindowManager, YtmViewManager,
};

// ---------------------------------------------------------------------------
// Health reporting
// ---------------------------------------------------------------------------

/// Health event captured by [`RecordingHealthReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded(Vec<&'static str>),
    BootstrapFailed(String),
    LifecycleAdvanced(LifecycleStage),
    IntegrationEnabled(String),
    IntegrationDisabled(String),
    IntegrationRestarted(String),
    IntegrationEnableFailed { name: String, error: String },
}

/// Records health events for assertions.
#[derive(Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Number of recorded events equal to `event`.
    pub fn count(&self, event: &HealthEvent) -> usize {
        self.events().iter().filter(|recorded| *recorded == event).count()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config, services: &[&'static str]) {
        self.record(HealthEvent::BootstrapSucceeded(services.to_vec()));
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn lifecycle_advanced(&self, stage: LifecycleStage) {
        self.record(HealthEvent::LifecycleAdvanced(stage));
    }

    fn integration_enabled(&self, name: &str) {
        self.record(HealthEvent::IntegrationEnabled(name.to_owned()));
    }

    fn integration_disabled(&self, name: &str) {
        self.record(HealthEvent::IntegrationDisabled(name.to_owned()));
    }

    fn integration_restarted(&self, name: &str) {
        self.record(HealthEvent::IntegrationRestarted(name.to_owned()));
    }

    fn integration_enable_failed(&self, name: &str, error: &IntegrationError) {
        self.record(HealthEvent::IntegrationEnableFailed {
            name: name.to_owned(),
            error: error.to_string(),
        });
    }
}

// ---------------------------------------------------------------------------
// Platform collaborators
// ---------------------------------------------------------------------------

/// Window recording broadcasts and focus requests.
#[derive(Default)]
pub struct RecordingWindow {
    broadcasts: Mutex<Vec<(String, Value)>>,
    focused: AtomicUsize,
}

impl RecordingWindow {
    pub fn broadcasts(&self) -> Vec<(String, Value)> {
        self.broadcasts.lock().expect("window mutex poisoned").clone()
    }

    pub fn focus_count(&self) -> usize {
        self.focused.load(Ordering::SeqCst)
    }
}

impl AppWindow for RecordingWindow {
    fn ipc_broadcast(&self, channel: &str, payload: &Value) {
        self.broadcasts
            .lock()
            .expect("window mutex poisoned")
            .push((channel.to_owned(), payload.clone()));
    }

    fn show_and_focus(&self) {
        self.focused.fetch_add(1, Ordering::SeqCst);
    }
}

/// Content view recording messages and stylesheets.
pub struct RecordingView {
    loaded: bool,
    sent: Mutex<Vec<(String, Value)>>,
    css: Mutex<Vec<(CssKey, String)>>,
    next_key: AtomicUsize,
}

impl RecordingView {
    /// View whose page has not finished loading.
    pub fn unloaded() -> Self {
        Self {
            loaded: false,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, Value)> {
        self.sent.lock().expect("view mutex poisoned").clone()
    }

    /// Stylesheets currently inserted, in insertion order.
    pub fn inserted_css(&self) -> Vec<String> {
        self.css
            .lock()
            .expect("view mutex poisoned")
            .iter()
            .map(|(_, css)| css.clone())
            .collect()
    }
}

impl Default for RecordingView {
    fn default() -> Self {
        Self {
            loaded: true,
            sent: Mutex::new(Vec::new()),
            css: Mutex::new(Vec::new()),
            next_key: AtomicUsize::new(0),
        }
    }
}

impl ContentView for RecordingView {
    fn send(&self, channel: &str, payload: &Value) -> Result<(), ViewError> {
        self.sent
            .lock()
            .expect("view mutex poisoned")
            .push((channel.to_owned(), payload.clone()));
        Ok(())
    }

    fn insert_css(&self, css: &str) -> Result<CssKey, ViewError> {
        let key = CssKey(format!("css-{}", self.next_key.fetch_add(1, Ordering::SeqCst)));
        self.css
            .lock()
            .expect("view mutex poisoned")
            .push((key.clone(), css.to_owned()));
        Ok(key)
    }

    fn remove_inserted_css(&self, key: &CssKey) -> Result<(), ViewError> {
        let mut css = self.css.lock().expect("view mutex poisoned");
        let position = css
            .iter()
            .position(|(inserted, _)| inserted == key)
            .ok_or_else(|| ViewError::Rejected {
                operation: "remove_inserted_css",
                message: format!("unknown key {}", key.0),
            })?;
        css.remove(position);
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }
}

// ---------------------------------------------------------------------------
// Scripted integrations
// ---------------------------------------------------------------------------

/// Integration hook recorded by [`CallLog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Setup,
    Enabled,
    Disabled,
}

/// Shared log of integration hook calls.
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<(&'static str, Hook)>>>,
}

impl CallLog {
    fn record(&self, name: &'static str, hook: Hook) {
        self.calls
            .lock()
            .expect("call log mutex poisoned")
            .push((name, hook));
    }

    pub fn calls(&self) -> Vec<(&'static str, Hook)> {
        self.calls.lock().expect("call log mutex poisoned").clone()
    }

    pub fn calls_for(&self, name: &str) -> Vec<Hook> {
        self.calls()
            .into_iter()
            .filter(|(recorded, _)| *recorded == name)
            .map(|(_, hook)| hook)
            .collect()
    }

    pub fn count(&self, name: &str, hook: Hook) -> usize {
        self.calls_for(name)
            .into_iter()
            .filter(|recorded| *recorded == hook)
            .count()
    }
}

/// Failure switches shared with a [`ScriptedIntegration`].
#[derive(Clone, Default)]
pub struct Faults {
    enable_failures: Arc<AtomicUsize>,
    disable_failures: Arc<AtomicUsize>,
    setup_fails: Arc<AtomicBool>,
}

impl Faults {
    /// Makes the next `count` calls to `on_enabled` fail.
    pub fn fail_next_enables(&self, count: usize) {
        self.enable_failures.store(count, Ordering::SeqCst);
    }

    /// Makes the next `count` calls to `on_disabled` fail.
    pub fn fail_next_disables(&self, count: usize) {
        self.disable_failures.store(count, Ordering::SeqCst);
    }

    pub fn fail_setup(&self) {
        self.setup_fails.store(true, Ordering::SeqCst);
    }
}

/// Integration that records its hooks and fails on demand.
pub struct ScriptedIntegration {
    name: &'static str,
    gating_key: &'static str,
    dependent_keys: &'static [&'static str],
    log: CallLog,
    faults: Faults,
}

impl ScriptedIntegration {
    /// Factory for an integration named `name`.
    pub fn factory(
        name: &'static str,
        gating_key: &'static str,
        dependent_keys: &'static [&'static str],
        log: &CallLog,
        faults: &Faults,
    ) -> IntegrationFactory {
        let log = log.clone();
        let faults = faults.clone();
        Box::new(move |_context: IntegrationContext| {
            Box::new(Self {
                name,
                gating_key,
                dependent_keys,
                log,
                faults,
            }) as Box<dyn Integration>
        })
    }
}

#[async_trait]
impl Integration for ScriptedIntegration {
    fn name(&self) -> &'static str {
        self.name
    }

    fn gating_key(&self) -> &'static str {
        self.gating_key
    }

    fn dependent_keys(&self) -> &'static [&'static str] {
        self.dependent_keys
    }

    fn on_setup(&mut self) -> Result<(), IntegrationError> {
        self.log.record(self.name, Hook::Setup);
        if self.faults.setup_fails.load(Ordering::SeqCst) {
            return Err(IntegrationError::Other(format!("{} setup failed", self.name)));
        }
        Ok(())
    }

    fn on_enabled(&mut self) -> Result<(), IntegrationError> {
        self.log.record(self.name, Hook::Enabled);
        let failing = self
            .faults
            .enable_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(IntegrationError::Other(format!("{} refused to start", self.name)));
        }
        Ok(())
    }

    async fn on_disabled(&mut self) -> Result<(), IntegrationError> {
        self.log.record(self.name, Hook::Disabled);
        tokio::task::yield_now().await;
        let failing = self
            .faults
            .disable_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(IntegrationError::Other(format!("{} failed to stop", self.name)));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Hosts
// ---------------------------------------------------------------------------

/// Fully initialised service host with recording collaborators.
pub struct IntegrationHarness {
    runtime: Runtime,
    host: ServiceHost,
    pub view: Arc<RecordingView>,
    pub window: Arc<RecordingWindow>,
    pub reporter: Arc<RecordingHealthReporter>,
}

impl IntegrationHarness {
    /// Harness over the default settings.
    pub fn ready() -> Self {
        Self::with_settings(json!({}))
    }

    /// Harness whose settings are `settings` merged over the defaults.
    pub fn with_settings(settings: Value) -> Self {
        Self::with_config(&Config::default(), settings)
    }

    /// Harness built from `config` with `settings` merged over the defaults.
    pub fn with_config(config: &Config, settings: Value) -> Self {
        Self::with_parts(config, Arc::new(HeadlessShortcutRegistrar), settings)
    }

    /// Harness binding global shortcuts through `registrar`.
    pub fn with_registrar(registrar: Arc<dyn ShortcutRegistrar>, settings: Value) -> Self {
        Self::with_parts(&Config::default(), registrar, settings)
    }

    fn with_parts(
        config: &Config,
        registrar: Arc<dyn ShortcutRegistrar>,
        settings: Value,
    ) -> Self {
        let runtime = Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("build test runtime");
        let reporter = Arc::new(RecordingHealthReporter::default());
        let mut host = build_host(
            config,
            reporter.clone(),
            registrar,
            Some(settings),
        )
        .expect("build service host");
        let view = Arc::new(RecordingView::default());
        let window = Arc::new(RecordingWindow::default());

        host.run_next_lifecycle().expect("pre-initialise");
        host.run_next_lifecycle().expect("initialise");
        host.get_service::<WindowManager>()
            .expect("window manager")
            .register_window(MAIN_WINDOW, window.clone());
        host.get_service::<YtmViewManager>()
            .expect("view manager")
            .attach_view(view.clone());
        host.run_next_lifecycle().expect("post-initialise");

        Self {
            runtime,
            host,
            view,
            window,
            reporter,
        }
    }

    pub fn handle(&self) -> HostHandle {
        self.host.handle()
    }

    pub fn context(&self) -> IntegrationContext {
        IntegrationContext::new(self.handle())
    }

    pub fn service<T: ServiceDefinition>(&self) -> Arc<T> {
        self.host
            .get_service::<T>()
            .unwrap_or_else(|error| panic!("{} unavailable: {error}", T::NAME))
    }

    pub fn config(&self) -> Arc<ConfigStore> {
        self.service::<ConfigStore>()
    }

    pub fn memory(&self) -> Arc<MemoryStore> {
        self.service::<MemoryStore>()
    }

    pub fn player(&self) -> Arc<PlayerStateStore> {
        self.service::<PlayerStateStore>()
    }

    pub fn ytm_view(&self) -> Arc<YtmViewManager> {
        self.service::<YtmViewManager>()
    }

    pub fn manager(&self) -> Arc<IntegrationManager> {
        self.service::<IntegrationManager>()
    }

    /// Writes `value` at `path` in the live settings.
    pub fn set(&self, path: &str, value: Value) {
        self.config().set(path, value).expect("settings write");
    }

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
