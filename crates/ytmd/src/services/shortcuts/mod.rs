//! Global media shortcuts bound from the `shortcuts` settings section.

use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::OnceCell;
use serde_json::Value;
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};
use thiserror::Error;
use tracing::{info, warn};
use ytmd_host::{
    InitializationGuard, Service, ServiceContext, ServiceDefinition, ServiceError, Subscription,
};

use crate::services::{ConfigStore, MemoryStore, YtmViewManager, lookup};

const SHORTCUT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::shortcuts");
const SHORTCUT_SECTION: &str = "shortcuts";

/// Callback invoked when a registered accelerator fires.
pub type ShortcutCallback = Arc<dyn Fn() + Send + Sync>;

/// Errors raised by the platform shortcut layer.
#[derive(Debug, Error)]
pub enum ShortcutError {
    /// The accelerator string could not be parsed.
    #[error("invalid accelerator '{accelerator}'")]
    InvalidAccelerator {
        /// Offending accelerator.
        accelerator: String,
    },
}

/// Platform global-shortcut registry.
pub trait ShortcutRegistrar: Send + Sync {
    /// Drops every shortcut registered by the shell.
    fn unregister_all(&self);

    /// Binds `accelerator` to `callback`.
    ///
    /// Returns `Ok(false)` when another application owns the accelerator.
    ///
    /// # Errors
    ///
    /// Returns [`ShortcutError`] when the accelerator is malformed.
    fn register(&self, accelerator: &str, callback: ShortcutCallback)
    -> Result<bool, ShortcutError>;
}

/// Player action reachable through a global shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum ShortcutAction {
    /// Toggle playback.
    PlayPause,
    /// Skip to the next track.
    Next,
    /// Return to the previous track.
    Previous,
    /// Toggle the like rating.
    ThumbsUp,
    /// Toggle the dislike rating.
    ThumbsDown,
    /// Raise the volume.
    VolumeUp,
    /// Lower the volume.
    VolumeDown,
}

impl ShortcutAction {
    /// Key of the accelerator inside the `shortcuts` section.
    #[must_use]
    pub fn setting_key(self) -> &'static str {
        self.into()
    }

    /// Remote-control command sent to the player.
    #[must_use]
    pub const fn remote_command(self) -> &'static str {
        match self {
            Self::PlayPause => "playPause",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::ThumbsUp => "toggleLike",
            Self::ThumbsDown => "toggleDislike",
            Self::VolumeUp => "volumeUp",
            Self::VolumeDown => "volumeDown",
        }
    }

    /// Memory-store flag recording a failed registration.
    #[must_use]
    pub const fn failure_flag(self) -> &'static str {
        match self {
            Self::PlayPause => "shortcutsPlayPauseRegisterFailed",
            Self::Next => "shortcutsNextRegisterFailed",
            Self::Previous => "shortcutsPreviousRegisterFailed",
            Self::ThumbsUp => "shortcutsThumbsUpRegisterFailed",
            Self::ThumbsDown => "shortcutsThumbsDownRegisterFailed",
            Self::VolumeUp => "shortcutsVolumeUpRegisterFailed",
            Self::VolumeDown => "shortcutsVolumeDownRegisterFailed",
        }
    }
}

struct ShortcutBindings {
    registrar: Arc<dyn ShortcutRegistrar>,
    view: Arc<YtmViewManager>,
    memory: Arc<MemoryStore>,
}

impl ShortcutBindings {
    fn reconcile(&self, shortcuts: Option<&Value>) {
        self.registrar.unregister_all();
        info!(target: SHORTCUT_TARGET, "unregistered shortcuts");

        for action in ShortcutAction::iter() {
            let accelerator = shortcuts
                .and_then(|section| lookup(section, action.setting_key()))
                .and_then(Value::as_str)
                .unwrap_or_default();
            let failed = !accelerator.is_empty() && !self.bind(action, accelerator);
            self.memory.set(action.failure_flag(), Value::Bool(failed));
        }
        info!(target: SHORTCUT_TARGET, "registered shortcuts");
    }

    fn bind(&self, action: ShortcutAction, accelerator: &str) -> bool {
        let view = Arc::clone(&self.view);
        let callback: ShortcutCallback = Arc::new(move || fire(&view, action));
        match self.registrar.register(accelerator, callback) {
            Ok(true) => {
                info!(
                    target: SHORTCUT_TARGET,
                    action = action.setting_key(),
                    "registered shortcut"
                );
                true
            }
            Ok(false) => {
                info!(
                    target: SHORTCUT_TARGET,
                    action = action.setting_key(),
                    "failed to register shortcut"
                );
                false
            }
            Err(error) => {
                warn!(
                    target: SHORTCUT_TARGET,
                    action = action.setting_key(),
                    error = %error,
                    "failed to register shortcut"
                );
                false
            }
        }
    }
}

fn fire(view: &Arc<YtmViewManager>, action: ShortcutAction) {
    if view.is_ready() {
        send_command(view, action);
        return;
    }
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        warn!(
            target: SHORTCUT_TARGET,
            action = action.setting_key(),
            "player not ready; shortcut dropped"
        );
        return;
    };
    let pending = Arc::clone(view);
    runtime.spawn(async move {
        if pending.ready().await.is_ok() {
            send_command(&pending, action);
        }
    });
}

fn send_command(view: &YtmViewManager, action: ShortcutAction) {
    if let Err(error) = view.execute_remote_command(action.remote_command(), None) {
        warn!(
            target: SHORTCUT_TARGET,
            action = action.setting_key(),
            error = %error,
            "shortcut command failed"
        );
    }
}

/// Service keeping global shortcuts in sync with settings.
pub struct ShortcutManager {
    registrar: Arc<dyn ShortcutRegistrar>,
    bindings: OnceCell<Arc<ShortcutBindings>>,
    subscription: Mutex<Option<Subscription>>,
    guard: InitializationGuard,
}

impl ShortcutManager {
    /// Builds a manager that binds shortcuts through `registrar`.
    #[must_use]
    pub fn new(registrar: Arc<dyn ShortcutRegistrar>) -> Self {
        Self {
            registrar,
            bindings: OnceCell::new(),
            subscription: Mutex::new(None),
            guard: InitializationGuard::new(),
        }
    }

    /// Re-binds every shortcut from the `shortcuts` section value; `None`
    /// leaves every action unbound. Does nothing before post-initialisation.
    pub fn reconcile(&self, shortcuts: Option<&Value>) {
        if let Some(bindings) = self.bindings.get() {
            bindings.reconcile(shortcuts);
        }
    }
}

impl Service for ShortcutManager {
    fn on_pre_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        self.guard.mark(Self::NAME)?;
        info!(target: SHORTCUT_TARGET, "shortcut manager initialized");
        Ok(())
    }

    fn on_post_initialized(&self, context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        let config = context.get_dependency::<ConfigStore>()?;
        let bindings = Arc::new(ShortcutBindings {
            registrar: Arc::clone(&self.registrar),
            view: context.get_dependency::<YtmViewManager>()?,
            memory: context.get_dependency::<MemoryStore>()?,
        });
        if self.bindings.set(Arc::clone(&bindings)).is_err() {
            return Err(ServiceError::AlreadyInitialized { service: Self::NAME });
        }

        let listener = Arc::clone(&bindings);
        let subscription = config.on_did_change(SHORTCUT_SECTION, move |shortcuts, _| {
            listener.reconcile(shortcuts);
        });
        *self.subscription.lock().unwrap_or_else(PoisonError::into_inner) = Some(subscription);

        bindings.reconcile(config.get(SHORTCUT_SECTION).as_ref());
        Ok(())
    }

    fn on_terminated(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        self.subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.registrar.unregister_all();
        Ok(())
    }
}

impl ServiceDefinition for ShortcutManager {
    const NAME: &'static str = "ShortcutManager";
    const DEPENDENCIES: &'static [&'static str] =
        &[ConfigStore::NAME, YtmViewManager::NAME, MemoryStore::NAME];
}
