//! Foreground process lifecycle for the `netactd` binary.
//!
//! The binary runs attached to its terminal: it bootstraps, binds both slots
//! to actuators that record each request in the log and echo the payload,
//! bridges termination signals to a shutdown token, and serves until one of
//! those signals arrives.

use std::io::Write;
use std::process::ExitCode;

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::bootstrap::{BootstrapError, ConfigLoader, bootstrap_with};
use crate::dispatch::{Action, ActuatorError, PayloadType};
use crate::transport::{ListenerError, ShutdownError, ShutdownToken, SignalBridge};

const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Errors that stop the daemon before or while serving.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bootstrap failed.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// Signal handlers could not be installed.
    #[error(transparent)]
    Signals(#[from] ShutdownError),
    /// The listener could not bind its socket.
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// Runs the daemon until `SIGTERM`, `SIGINT`, `SIGQUIT` or `SIGHUP`
/// arrives.
///
/// Failures are written to `stderr` as a single line, since telemetry may
/// not be installed yet.
pub fn run<W: Write>(loader: &dyn ConfigLoader, stderr: &mut W) -> ExitCode {
    let shutdown = ShutdownToken::new();
    let outcome = SignalBridge::install(shutdown.clone())
        .map_err(LaunchError::from)
        .and_then(|_signals| run_daemon(loader, &shutdown));
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            // stderr itself failing leaves nothing else to report to.
            let _ = writeln!(stderr, "netactd: {error}");
            ExitCode::FAILURE
        }
    }
}

/// Bootstraps and serves until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns a [`LaunchError`] if bootstrap or binding fails.
pub fn run_daemon(loader: &dyn ConfigLoader, shutdown: &ShutdownToken) -> Result<(), LaunchError> {
    let daemon = bootstrap_with(loader)?;
    let mut service = daemon.service();
    service.register_setpoint(
        |payload: &Value| record(Action::Setpoint, payload),
        Some(PayloadType::Number),
        Vec::new(),
    );
    service.register_do(
        |payload: &Value| record(Action::Do, payload),
        Some(PayloadType::Boolean),
        Vec::new(),
    );

    service.listen(None, shutdown)?;
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}

// The built-in slots only record what they were asked to do.
#[expect(
    clippy::unnecessary_wraps,
    reason = "actuators must return Result to be registered"
)]
fn record(action: Action, payload: &Value) -> Result<Value, ActuatorError> {
    info!(target: PROCESS_TARGET, action = action.as_str(), %payload, "actuation requested");
    Ok(payload.clone())
}
