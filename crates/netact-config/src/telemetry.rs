//! Output settings for daemon telemetry.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Shape of the log lines the daemon writes to stderr.
///
/// Accepted spellings are case-insensitive, so `NETACT_LOG_FORMAT=JSON` and
/// `--log-format compact` both parse.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One flattened JSON object per event.
    #[default]
    Json,
    /// Compact single-line text for terminals.
    Compact,
}

/// Error returned when a [`LogFormat`] name is not recognised.
pub type LogFormatParseError = strum::ParseError;
