//! Structured health reporting for shell lifecycle events.

use std::sync::Arc;

use ytmd_config::Config;
use ytmd_host::LifecycleStage;

use crate::bootstrap::BootstrapError;
use crate::integrations::IntegrationError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after the service host has been built.
    fn bootstrap_succeeded(&self, config: &Config, services: &[&'static str]);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked after every service returned from `stage`.
    fn lifecycle_advanced(&self, stage: LifecycleStage);

    /// Invoked after an integration was enabled.
    fn integration_enabled(&self, name: &str);

    /// Invoked after an integration was disabled.
    fn integration_disabled(&self, name: &str);

    /// Invoked after an integration was restarted because a dependent
    /// setting changed.
    fn integration_restarted(&self, name: &str);

    /// Invoked when an integration could not be enabled.
    fn integration_enable_failed(&self, name: &str, error: &IntegrationError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config, services: &[&'static str]) {
        (**self).bootstrap_succeeded(config, services);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn lifecycle_advanced(&self, stage: LifecycleStage) {
        (**self).lifecycle_advanced(stage);
    }

    fn integration_enabled(&self, name: &str) {
        (**self).integration_enabled(name);
    }

    fn integration_disabled(&self, name: &str) {
        (**self).integration_disabled(name);
    }

    fn integration_restarted(&self, name: &str) {
        (**self).integration_restarted(name);
    }

    fn integration_enable_failed(&self, name: &str, error: &IntegrationError) {
        (**self).integration_enable_failed(name, error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting shell bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config, services: &[&'static str]) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            services = ?services,
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            "shell bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "shell bootstrap failed"
        );
    }

    fn lifecycle_advanced(&self, stage: LifecycleStage) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "lifecycle_advanced",
            stage = %stage,
            "service host advanced"
        );
    }

    fn integration_enabled(&self, name: &str) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "integration_enabled",
            integration = name,
            "enabled integration"
        );
    }

    fn integration_disabled(&self, name: &str) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "integration_disabled",
            integration = name,
            "disabled integration"
        );
    }

    fn integration_restarted(&self, name: &str) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "integration_restarted",
            integration = name,
            "restarted integration after dependent settings changed"
        );
    }

    fn integration_enable_failed(&self, name: &str, error: &IntegrationError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "integration_enable_failed",
            integration = name,
            error = %error,
            "the '{name}' integration failed to be enabled and will be unavailable"
        );
    }
}
