//! Configuration for the ytmd shell process.
//!
//! Values are layered by `ortho_config`: command-line flags override
//! `YTMD_*` environment variables, which override a discovered or explicit
//! configuration file, which overrides the defaults below.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod logging;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_STATE_FLUSH_INTERVAL_SECS, DEFAULT_STATE_WRITE_THRESHOLD,
    default_log_filter, default_log_filter_string, default_log_format,
    default_state_flush_interval_secs, default_state_write_threshold,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Shell configuration resolved from every layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "YTMD")]
pub struct Config {
    /// `tracing` filter expression, e.g. `info` or `ytmd=debug`.
    #[serde(default = "defaults::default_log_filter_string")]
    pub log_filter: String,
    /// Output format for log records.
    #[serde(default = "defaults::default_log_format")]
    pub log_format: LogFormat,
    /// Buffered window-state updates that force an immediate write.
    #[serde(default = "defaults::default_state_write_threshold")]
    pub state_write_threshold: u32,
    /// Seconds of quiet after which buffered window state is written.
    #[serde(default = "defaults::default_state_flush_interval_secs")]
    pub state_flush_interval_secs: u64,
}

impl Config {
    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Window-state write threshold; never below one.
    #[must_use]
    pub fn state_write_threshold(&self) -> u32 {
        self.state_write_threshold.max(1)
    }

    /// Debounce interval for buffered window state.
    #[must_use]
    pub const fn state_flush_interval(&self) -> Duration {
        Duration::from_secs(self.state_flush_interval_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            state_write_threshold: default_state_write_threshold(),
            state_flush_interval_secs: default_state_flush_interval_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.log_filter(), "info");
        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.state_write_threshold(), 512);
        assert_eq!(config.state_flush_interval(), Duration::from_secs(30));
    }

    #[test]
    fn zero_threshold_is_clamped() {
        let config = Config {
            state_write_threshold: 0,
            ..Config::default()
        };
        assert_eq!(config.state_write_threshold(), 1);
    }

    #[rstest]
    #[case("json", LogFormat::Json)]
    #[case("COMPACT", LogFormat::Compact)]
    #[case("Compact", LogFormat::Compact)]
    fn log_format_parses_case_insensitively(#[case] input: &str, #[case] expected: LogFormat) {
        assert_eq!(input.parse::<LogFormat>().expect("valid format"), expected);
    }

    #[test]
    fn log_format_rejects_unknown_values() {
        assert!("pretty".parse::<LogFormat>().is_err());
    }

    #[test]
    fn log_format_displays_in_snake_case() {
        assert_eq!(LogFormat::Compact.to_string(), "compact");
    }
}
