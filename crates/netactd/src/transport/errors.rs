//! Error types for socket listener operations.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors surfaced while binding the actuation listener. These abort startup.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The host name could not be resolved.
    #[error("failed to resolve TCP address {host}:{port}: {source}")]
    Resolve {
        /// Host that failed to resolve.
        host: String,
        /// Requested port.
        port: u16,
        /// Underlying resolver error.
        #[source]
        source: io::Error,
    },
    /// Resolution succeeded but produced no addresses.
    #[error("no TCP addresses resolved for {host}:{port}")]
    ResolveEmpty {
        /// Host that resolved to nothing.
        host: String,
        /// Requested port.
        port: u16,
    },
    /// Binding the socket failed, usually because the port is in use.
    #[error("failed to bind TCP listener at {addr}: {source}")]
    BindTcp {
        /// Address the listener attempted to bind.
        addr: SocketAddr,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The bound address could not be read back.
    #[error("failed to read bound address: {source}")]
    LocalAddr {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The socket could not be switched to non-blocking accepts.
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}
