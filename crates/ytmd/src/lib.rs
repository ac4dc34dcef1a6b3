//! Application shell core for the ytmd desktop player.
//!
//! The shell hosts a fixed set of long-lived services on the
//! [`ytmd_host`] dependency-injection kernel and walks them through the
//! global lifecycle: pre-initialise, initialise, post-initialise, and
//! terminate. Each stage is a barrier, so a service's hooks only ever observe
//! dependencies that finished the same stage.
//!
//! On top of the services sits the [`IntegrationManager`], which owns the
//! optional feature modules (Discord presence, the volume ratio tweak, and
//! custom stylesheets). After the `app-ready` pass it reconciles every
//! integration against the settings tree each time a setting changes,
//! enabling, disabling, or restarting integrations as their gating and
//! dependent keys dictate.
//!
//! Bootstrap follows the familiar sequence: load configuration through
//! [`ytmd_config`], install structured telemetry, build the service host,
//! then hand a [`Shell`] back to the caller. Health hooks report every step
//! so failures are visible in the logs.

mod bootstrap;
pub mod headless;
mod health;
pub mod integrations;
mod process;
pub mod protocol;
pub mod services;
mod shell;
mod telemetry;

pub use bootstrap::{
    BootstrapError, Collaborators, ConfigLoader, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use integrations::{Integration, IntegrationFactory, IntegrationManager, default_integrations};
pub use process::{LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_shell};
pub use shell::{Shell, ShellError};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
