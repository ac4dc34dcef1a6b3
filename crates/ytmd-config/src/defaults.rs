use crate::logging::LogFormat;

/// Default log filter expression used by the shell.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Buffered window-state updates that force an immediate write.
pub const DEFAULT_STATE_WRITE_THRESHOLD: u32 = 512;

/// Seconds of quiet after which buffered window state is written.
pub const DEFAULT_STATE_FLUSH_INTERVAL_SECS: u64 = 30;

/// Default log filter expression used by the shell.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the shell.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default window-state write threshold.
#[must_use]
pub const fn default_state_write_threshold() -> u32 {
    DEFAULT_STATE_WRITE_THRESHOLD
}

/// Default window-state flush interval in seconds.
#[must_use]
pub const fn default_state_flush_interval_secs() -> u64 {
    DEFAULT_STATE_FLUSH_INTERVAL_SECS
}
