//! Output formats for the shell's log records.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How the shell writes log records to standard error.
///
/// Parsed case-insensitively from `--log-format`, `YTMD_LOG_FORMAT` or the
/// configuration file.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per record, fields flattened into the event.
    #[default]
    Json,
    /// Single-line text for reading in a terminal.
    Compact,
}

impl LogFormat {
    /// Returns `true` for machine-readable output, which is never coloured.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Error returned when text names no [`LogFormat`].
pub type LogFormatParseError = strum::ParseError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_json_is_structured() {
        assert!(LogFormat::Json.is_structured());
        assert!(!LogFormat::Compact.is_structured());
    }
}
