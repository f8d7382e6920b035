//! Daemon bootstrap orchestration.

use std::sync::Arc;

use netact_config::Config;
use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;
use tracing::{error, info};

use crate::service::NetworkActuation;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

const BOOTSTRAP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bootstrap");

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader's error when no configuration can be resolved.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that resolves configuration from files, environment and the
/// process command line.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader returning a configuration fixed up front.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already resolved configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The configured port cannot be served.
    #[error("invalid listener port {port}: the daemon needs a fixed port")]
    InvalidPort {
        /// Port taken from configuration.
        port: u16,
    },
}

/// Result of a successful bootstrap.
#[derive(Debug)]
pub struct Daemon {
    config: Config,
    telemetry: TelemetryHandle,
}

impl Daemon {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Builds an unbound endpoint carrying the configured listener settings.
    #[must_use]
    pub fn service(&self) -> NetworkActuation {
        NetworkActuation::from_config(&self.config)
    }
}

/// Loads configuration, installs telemetry and validates listener settings.
///
/// # Errors
///
/// Returns a [`BootstrapError`] naming the first step that failed.
pub fn bootstrap_with(loader: &dyn ConfigLoader) -> Result<Daemon, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;

    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;

    if config.port() == 0 {
        let failure = BootstrapError::InvalidPort { port: config.port() };
        error!(target: BOOTSTRAP_TARGET, error = %failure, "daemon bootstrap failed");
        return Err(failure);
    }

    info!(
        target: BOOTSTRAP_TARGET,
        host = config.host(),
        port = config.port(),
        log_filter = config.log_filter(),
        log_format = %config.log_format(),
        status_mode = %config.status_mode(),
        idle_timeout_ms = config.idle_timeout_ms,
        "daemon bootstrap completed"
    );
    Ok(Daemon { config, telemetry })
}
