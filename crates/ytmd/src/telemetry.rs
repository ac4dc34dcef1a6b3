//! Structured telemetry initialisation for the shell.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use ytmd_config::{Config, LogFormat};

/// Format of the subscriber installed by the first successful call.
static INSTALLED_FORMAT: OnceCell<LogFormat> = OnceCell::new();

/// Handle describing the process-wide subscriber.
#[derive(Debug, Clone, Copy)]
pub struct TelemetryHandle {
    format: LogFormat,
    installed_now: bool,
}

impl TelemetryHandle {
    /// Output format of the installed subscriber.
    #[must_use]
    pub const fn format(&self) -> LogFormat {
        self.format
    }

    /// Returns `true` when this call installed the subscriber.
    #[must_use]
    pub const fn installed_now(&self) -> bool {
        self.installed_now
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter expression did not parse.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Another global subscriber was already installed.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global tracing subscriber on first use.
///
/// Later calls keep the subscriber already in place, whatever configuration
/// they pass, and report its format.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or another
/// subscriber already owns the process.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    let mut installed_now = false;
    let format = *INSTALLED_FORMAT.get_or_try_init(|| {
        install_subscriber(config)?;
        installed_now = true;
        Ok::<_, TelemetryError>(config.log_format())
    })?;
    Ok(TelemetryHandle {
        format,
        installed_now,
    })
}

fn install_subscriber(config: &Config) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let format = config.log_format();
    let ansi = !format.is_structured() && io::stderr().is_terminal();
    let builder = |filter: EnvFilter| {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_writer(io::stderr)
            .with_ansi(ansi)
            .with_timer(fmt::time::UtcTime::rfc_3339())
    };

    let subscriber: Box<dyn Subscriber + Send + Sync> = match format {
        LogFormat::Json => Box::new(builder(filter).json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder(filter).compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> Config {
        Config {
            log_filter: "off".to_owned(),
            log_format: LogFormat::Compact,
            ..Config::default()
        }
    }

    #[test]
    fn rejects_malformed_filters() {
        let config = Config {
            log_filter: "ytmd=notalevel".to_owned(),
            ..Config::default()
        };
        assert!(matches!(
            install_subscriber(&config),
            Err(TelemetryError::Filter(_))
        ));
    }

    #[test]
    fn later_calls_keep_the_installed_subscriber() {
        let first = initialise(&quiet()).expect("telemetry installs");
        let second = initialise(&Config::default()).expect("second call succeeds");

        assert!(!second.installed_now());
        assert_eq!(second.format(), first.format());
    }
}
