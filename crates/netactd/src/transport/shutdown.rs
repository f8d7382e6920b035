//! Cooperative shutdown for the listen loop.
//!
//! The listener never installs process-wide handlers itself. Callers pass a
//! [`ShutdownToken`] into `listen`; the loop observes it at the receive
//! boundary. [`SignalBridge`] connects termination signals to a token for
//! binaries that want the conventional behaviour.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use thiserror::Error;
use tracing::info;

use super::LISTENER_TARGET;

const SHUTDOWN_SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

/// Shared cancellation flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    cancelled: Arc<AtomicBool>,
}

impl ShutdownToken {
    /// Creates a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests shutdown. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns whether shutdown has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Errors reported while wiring signals to a token.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Cancels a [`ShutdownToken`] when the process receives a termination
/// signal. Dropping the bridge stops the watcher thread.
pub struct SignalBridge {
    handle: Handle,
    watcher: Option<JoinHandle<()>>,
}

impl SignalBridge {
    /// Starts watching `SIGTERM`, `SIGINT`, `SIGQUIT` and `SIGHUP`.
    ///
    /// # Errors
    ///
    /// Returns `ShutdownError::Install` if the handlers cannot be registered.
    pub fn install(token: ShutdownToken) -> Result<Self, ShutdownError> {
        let mut signals =
            Signals::new(SHUTDOWN_SIGNALS).map_err(|source| ShutdownError::Install { source })?;
        let handle = signals.handle();
        let watcher = thread::spawn(move || {
            if let Some(signal) = signals.forever().next() {
                info!(
                    target: LISTENER_TARGET,
                    signal,
                    "shutdown signal received"
                );
                token.cancel();
            }
        });
        Ok(Self {
            handle,
            watcher: Some(watcher),
        })
    }
}

impl Drop for SignalBridge {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(watcher) = self.watcher.take() {
            let _ = watcher.join();
        }
    }
}
