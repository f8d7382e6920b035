//! Request/reply listener for the actuation endpoint.
//!
//! The transport binds a TCP socket and serves one connection at a time on
//! the calling thread. Requests and replies are newline-delimited JSON and
//! strictly alternate. The loop ends only when its [`ShutdownToken`] is
//! cancelled.

mod errors;
mod exchange;
mod listener;
mod shutdown;

pub use self::errors::ListenerError;
pub use self::exchange::ExchangeHandler;
pub use self::listener::ActuationListener;
pub use self::shutdown::{ShutdownError, ShutdownToken, SignalBridge};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
