//! Launch sequencing and the shell's run loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Builder;
use tokio::{task, time};
use tracing::{debug, info, warn};

use crate::bootstrap::{
    Collaborators, ConfigLoader, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
use crate::headless::{
    HeadlessShortcutRegistrar, HeadlessView, LoggingWindow, OfflinePresenceClient,
};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::integrations::{IntegrationFactory, default_integrations};
use crate::shell::{Shell, ShellError};

use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};
use super::{PROCESS_TARGET, SHUTDOWN_TIMEOUT};

const FLUSH_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Collaborators required to launch the shell.
pub(crate) struct LaunchPlan<L, S> {
    pub(crate) loader: L,
    pub(crate) shutdown: S,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) collaborators: Collaborators,
    pub(crate) integrations: Vec<IntegrationFactory>,
}

/// Runs the shell with headless collaborators until a termination signal
/// arrives.
///
/// # Errors
///
/// Returns [`LaunchError`] when configuration, bootstrap, the shell, or the
/// signal listener fails.
pub fn run_shell() -> Result<(), LaunchError> {
    let plan = LaunchPlan {
        loader: SystemConfigLoader,
        shutdown: SystemShutdownSignal::new(),
        reporter: Arc::new(StructuredHealthReporter::new()),
        collaborators: Collaborators {
            main_window: Arc::new(LoggingWindow),
            view: Arc::new(HeadlessView::default()),
            shortcuts: Arc::new(HeadlessShortcutRegistrar),
            settings: None,
        },
        integrations: default_integrations(Arc::new(OfflinePresenceClient)),
    };
    run_shell_with(plan)
}

/// Runs the shell with injected collaborators.
pub(crate) fn run_shell_with<L, S>(plan: LaunchPlan<L, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal + 'static,
{
    let LaunchPlan {
        loader,
        shutdown,
        reporter,
        collaborators,
        integrations,
    } = plan;

    let config = loader.load()?;
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|source| LaunchError::Runtime { source })?;
    let static_loader = StaticConfigLoader::new(config);
    let mut shell = bootstrap_with(&static_loader, reporter, collaborators)?;
    info!(target: PROCESS_TARGET, "starting shell runtime");

    let outcome = runtime.block_on(run_until_shutdown(&mut shell, integrations, shutdown));
    runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    outcome
}

async fn run_until_shutdown<S>(
    shell: &mut Shell,
    integrations: Vec<IntegrationFactory>,
    shutdown: S,
) -> Result<(), LaunchError>
where
    S: ShutdownSignal + 'static,
{
    shell.before_ready(integrations).await?;
    shell.ready().await?;
    let outcome = supervise(shell, shutdown).await;
    shell.terminate().await?;
    outcome
}

/// Applies settings changes and flushes window state until shutdown is
/// requested.
async fn supervise<S>(shell: &Shell, shutdown: S) -> Result<(), LaunchError>
where
    S: ShutdownSignal + 'static,
{
    let manager = shell.integrations().map_err(ShellError::from)?;
    let signal = task::spawn_blocking(move || shutdown.wait());
    let changes = manager.run_change_loop();
    tokio::pin!(signal, changes);
    let mut flush = time::interval(FLUSH_POLL_INTERVAL);
    let mut changes_open = true;

    loop {
        tokio::select! {
            joined = &mut signal => {
                let waited = joined.map_err(|source| LaunchError::Listener { source })?;
                return waited.map_err(LaunchError::from);
            }
            result = &mut changes, if changes_open => {
                changes_open = false;
                if let Err(error) = result {
                    warn!(
                        target: PROCESS_TARGET,
                        error = %error,
                        "settings changes are no longer applied"
                    );
                }
            }
            _ = flush.tick() => {
                if shell.flush_state().map_err(ShellError::from)? {
                    debug!(target: PROCESS_TARGET, "window state flushed");
                }
            }
        }
    }
}
