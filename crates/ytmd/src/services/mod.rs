//! Long-lived services hosted by the shell.
//!
//! Registration order matters only for services without a dependency path
//! between them; [`ytmd_host::ServiceCollection`] handles the rest.

pub mod config_store;
pub mod memory_store;
pub mod player_state;
pub mod shortcuts;
pub mod state_manager;
pub mod watchdog;
pub mod window_manager;
pub mod ytm_view;

pub use config_store::{
    ConfigStore, STATE_CHANGED_CHANNEL, SettingsChange, SettingsError, StoreSchema, is_truthy,
    lookup,
};
pub use memory_store::{MEMORY_CHANGED_CHANNEL, MemoryChange, MemoryStore};
pub use player_state::{PlayerState, PlayerStateStore, Thumbnail, VideoDetails, VideoState};
pub use shortcuts::{
    ShortcutAction, ShortcutCallback, ShortcutError, ShortcutManager, ShortcutRegistrar,
};
pub use state_manager::StateManager;
pub use watchdog::{CrashReport, WatchDog};
pub use window_manager::{AppWindow, MAIN_WINDOW, WindowManager};
pub use ytm_view::{
    ContentView, CssKey, REMOTE_EXECUTE_CHANNEL, REMOTE_SCRIPT_CHANNEL, ViewError, YtmViewManager,
};
