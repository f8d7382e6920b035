//! Default values shared by the daemon and its configuration layers.

/// Default TCP port the actuation listener binds to.
pub const DEFAULT_PORT: u16 = 26462;

/// Default interface the actuation listener binds to (all IPv4 interfaces).
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default time, in milliseconds, a connection may stay silent between
/// requests before the listener closes it.
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 2_000;

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Owned default host used where allocation is required (e.g. serde).
#[must_use]
pub fn default_host() -> String {
    DEFAULT_HOST.to_owned()
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the daemon.
#[must_use]
pub const fn default_log_format() -> crate::telemetry::LogFormat {
    crate::telemetry::LogFormat::Json
}

/// Default response status policy.
#[must_use]
pub const fn default_status_mode() -> crate::status::StatusMode {
    crate::status::StatusMode::Compat
}
