//! Configuration for the network actuation daemon.
//!
//! Values are layered by [`ortho_config`]: compiled defaults first, then an
//! optional configuration file (`--config-path` or `NETACT_CONFIG_PATH`), then
//! `NETACT_*` environment variables, and finally command-line flags.
//!
//! ```toml
//! host = "127.0.0.1"
//! port = 26462
//! log_filter = "netactd=debug"
//! log_format = "compact"
//! status_mode = "compat"
//! idle_timeout_ms = 2000
//! ```

mod defaults;
mod status;
mod telemetry;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_HOST, DEFAULT_IDLE_TIMEOUT_MS, DEFAULT_LOG_FILTER, DEFAULT_PORT, default_host, default_log_filter,
    default_log_format, default_status_mode,
};
pub use status::{StatusMode, StatusModeParseError};
pub use telemetry::{LogFormat, LogFormatParseError};

/// Resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "NETACT")]
pub struct Config {
    /// Interface the actuation listener binds to.
    #[ortho_config(default = default_host())]
    pub host: String,
    /// Port the actuation listener binds to.
    #[ortho_config(default = DEFAULT_PORT)]
    pub port: u16,
    /// `tracing` filter expression applied to daemon telemetry.
    #[ortho_config(default = default_log_filter())]
    pub log_filter: String,
    /// Output format for daemon telemetry.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Policy for the `status` field of response envelopes.
    #[ortho_config(default = default_status_mode())]
    pub status_mode: StatusMode,
    /// Milliseconds a client may stay silent between requests before its
    /// connection is closed.
    #[ortho_config(default = DEFAULT_IDLE_TIMEOUT_MS)]
    pub idle_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: DEFAULT_PORT,
            log_filter: default_log_filter(),
            log_format: default_log_format(),
            status_mode: default_status_mode(),
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Interface the listener binds to.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port the listener binds to.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Telemetry output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Response status policy.
    #[must_use]
    pub const fn status_mode(&self) -> StatusMode {
        self.status_mode
    }

    /// Idle timeout applied to each client connection.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}
