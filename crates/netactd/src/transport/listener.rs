//! Blocking request/reply listener for the actuation endpoint.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::dispatch::DispatchError;

use super::exchange::{Exchange, ExchangeHandler, IDLE_TIMEOUT, ReceiveError, Received};
use super::shutdown::ShutdownToken;
use super::{LISTENER_TARGET, ListenerError};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// TCP listener serving one client at a time on the calling thread.
///
/// A connected client that stays silent between requests for longer than the
/// idle timeout is disconnected so that waiting clients get their turn.
#[derive(Debug)]
pub struct ActuationListener {
    listener: TcpListener,
    address: SocketAddr,
    idle_timeout: Duration,
}

impl ActuationListener {
    /// Binds `host:port`. Port `0` picks an ephemeral port.
    ///
    /// # Errors
    ///
    /// Returns a [`ListenerError`] if the address does not resolve or cannot
    /// be bound.
    pub fn bind(host: &str, port: u16) -> Result<Self, ListenerError> {
        let listener = bind_tcp(host, port)?;
        let address = listener
            .local_addr()
            .map_err(|source| ListenerError::LocalAddr { source })?;
        listener
            .set_nonblocking(true)
            .map_err(|source| ListenerError::NonBlocking { source })?;
        Ok(Self {
            listener,
            address,
            idle_timeout: IDLE_TIMEOUT,
        })
    }

    /// Replaces the idle timeout applied to each connection between
    /// requests.
    #[must_use]
    pub const fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Address the listener is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.address
    }

    /// Serves requests until `shutdown` is cancelled, then releases the
    /// socket.
    ///
    /// Connections are served sequentially. Errors confined to one request
    /// or one connection are logged and never end the loop.
    pub fn serve<H>(self, handler: &H, shutdown: &ShutdownToken)
    where
        H: ExchangeHandler + ?Sized,
    {
        info!(
            target: LISTENER_TARGET,
            address = %self.address,
            "actuation listener active"
        );
        let mut last_error = None::<io::ErrorKind>;
        while !shutdown.is_cancelled() {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    last_error = None;
                    serve_connection(stream, peer, self.idle_timeout, handler, shutdown);
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_BACKOFF);
                }
                Err(error) => {
                    let kind = error.kind();
                    if last_error != Some(kind) {
                        warn!(
                            target: LISTENER_TARGET,
                            error = %error,
                            "socket accept error"
                        );
                    }
                    last_error = Some(kind);
                    thread::sleep(ERROR_BACKOFF);
                }
            }
        }
        info!(
            target: LISTENER_TARGET,
            address = %self.address,
            "actuation listener shut down"
        );
    }
}

fn serve_connection<H>(
    stream: TcpStream,
    peer: SocketAddr,
    idle_timeout: Duration,
    handler: &H,
    shutdown: &ShutdownToken,
) where
    H: ExchangeHandler + ?Sized,
{
    let mut exchange = match Exchange::tcp(stream, idle_timeout) {
        Ok(exchange) => exchange,
        Err(error) => {
            warn!(target: LISTENER_TARGET, %peer, %error, "failed to configure connection");
            return;
        }
    };
    debug!(target: LISTENER_TARGET, %peer, "client connected");

    loop {
        let reply = match exchange.receive(shutdown) {
            Ok(Received::Line(request)) => handler.respond(&request),
            Ok(Received::Closed) => {
                debug!(target: LISTENER_TARGET, %peer, "client disconnected");
                return;
            }
            Ok(Received::Cancelled) => return,
            Ok(Received::Idle) => {
                debug!(
                    target: LISTENER_TARGET,
                    %peer,
                    idle_timeout_ms = idle_timeout.as_millis(),
                    "closing idle connection"
                );
                return;
            }
            Err(ReceiveError::TooLarge { max }) => {
                let error = DispatchError::malformed(format!("Request exceeds {max} bytes"));
                if let Err(error) = exchange.send(&handler.reject(error)) {
                    warn!(target: LISTENER_TARGET, %peer, %error, "failed to send reply");
                    return;
                }
                exchange.drain(shutdown, max);
                return;
            }
            Err(error) => {
                warn!(target: LISTENER_TARGET, %peer, %error, "connection error");
                return;
            }
        };

        if let Err(error) = exchange.send(&reply) {
            warn!(target: LISTENER_TARGET, %peer, %error, "failed to send reply");
            return;
        }
    }
}

fn bind_tcp(host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?;
    let addr = addrs.next().ok_or_else(|| ListenerError::ResolveEmpty {
        host: host.to_owned(),
        port,
    })?;
    TcpListener::bind(addr).map_err(|source| ListenerError::BindTcp { addr, source })
}
