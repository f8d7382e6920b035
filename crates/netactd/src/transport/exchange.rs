//! Request/reply framing over a single client connection.
//!
//! Each request is one newline-terminated JSON line and is answered by one
//! response line before the next request is read. Reads use a short timeout
//! so the shutdown token is observed while waiting for a client. A client
//! that sends nothing for [`IDLE_TIMEOUT`] is disconnected, so a silent or
//! half-open connection cannot hold the endpoint away from other clients.

use std::io::{self, Read};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::dispatch::{DispatchError, ResponseEnvelope, ResponseWriter};

use super::shutdown::ShutdownToken;

/// Maximum size of a single request line in bytes.
pub(crate) const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Interval at which a blocked receive re-checks the shutdown token.
pub(crate) const RECEIVE_POLL: Duration = Duration::from_millis(100);

/// How long a connection may wait between requests before it is closed.
pub(crate) const IDLE_TIMEOUT: Duration =
    Duration::from_millis(netact_config::DEFAULT_IDLE_TIMEOUT_MS);

/// Produces replies for request lines read off a connection.
pub trait ExchangeHandler {
    /// Produces the reply for one request line. Must not fail.
    fn respond(&self, request: &[u8]) -> ResponseEnvelope;

    /// Produces the reply for a request the transport refused to read in full.
    fn reject(&self, error: DispatchError) -> ResponseEnvelope;
}

/// Outcome of waiting for the next request.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Received {
    /// A complete request line, including its delimiter when present.
    Line(Vec<u8>),
    /// The client closed the connection between requests.
    Closed,
    /// Shutdown was requested while waiting.
    Cancelled,
    /// No byte of a new request arrived within the idle timeout.
    Idle,
}

#[derive(Debug, Error)]
pub(crate) enum ReceiveError {
    #[error("request exceeds {max} bytes")]
    TooLarge { max: usize },
    #[error("failed to read request: {0}")]
    Io(#[from] io::Error),
}

/// One accepted client connection.
pub(crate) struct Exchange<S> {
    stream: S,
    pending: Vec<u8>,
    idle_timeout: Duration,
}

impl Exchange<TcpStream> {
    /// Wraps an accepted TCP stream, switching it to blocking reads with a
    /// poll timeout.
    pub(crate) fn tcp(stream: TcpStream, idle_timeout: Duration) -> io::Result<Self> {
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(RECEIVE_POLL))?;
        Ok(Self::new(stream).with_idle_timeout(idle_timeout))
    }
}

impl<S: Read + io::Write> Exchange<S> {
    pub(crate) fn new(stream: S) -> Self {
        Self {
            stream,
            pending: Vec::new(),
            idle_timeout: IDLE_TIMEOUT,
        }
    }

    pub(crate) const fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Blocks until a full request line arrives, the peer closes the
    /// connection, `shutdown` is cancelled, or the client stays silent for
    /// the idle timeout. A partially received request is waited for.
    pub(crate) fn receive(&mut self, shutdown: &ShutdownToken) -> Result<Received, ReceiveError> {
        let mut chunk = [0_u8; 1024];
        let waiting_since = Instant::now();
        loop {
            if let Some(line) = self.take_line()? {
                return Ok(Received::Line(line));
            }
            enforce_limit(self.pending.len())?;
            if shutdown.is_cancelled() {
                return Ok(Received::Cancelled);
            }

            match self.stream.read(&mut chunk) {
                Ok(0) if self.pending.is_empty() => return Ok(Received::Closed),
                Ok(0) => return Ok(Received::Line(std::mem::take(&mut self.pending))),
                Ok(read) => self.pending.extend_from_slice(&chunk[..read]),
                Err(error) if is_retryable(&error) => {
                    if self.pending.is_empty() && waiting_since.elapsed() >= self.idle_timeout {
                        return Ok(Received::Idle);
                    }
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// Reads and discards input until the peer closes, `limit` more bytes
    /// have been read, or shutdown is requested. Closing a socket with unread
    /// input resets the connection and can destroy a reply still in flight.
    pub(crate) fn drain(&mut self, shutdown: &ShutdownToken, limit: usize) {
        self.pending.clear();
        let mut chunk = [0_u8; 1024];
        let mut discarded = 0;
        while discarded < limit && !shutdown.is_cancelled() {
            match self.stream.read(&mut chunk) {
                Ok(0) => return,
                Ok(read) => discarded += read,
                Err(error) if is_retryable(&error) => {}
                Err(_) => return,
            }
        }
    }

    /// Writes one response line.
    pub(crate) fn send(&mut self, envelope: &ResponseEnvelope) -> io::Result<()> {
        ResponseWriter::new(&mut self.stream).write_envelope(envelope)
    }

    fn take_line(&mut self) -> Result<Option<Vec<u8>>, ReceiveError> {
        let Some(newline) = self.pending.iter().position(|byte| *byte == b'\n') else {
            return Ok(None);
        };
        enforce_limit(newline)?;
        Ok(Some(self.pending.drain(..=newline).collect()))
    }
}

fn is_retryable(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}

fn enforce_limit(size: usize) -> Result<(), ReceiveError> {
    if size > MAX_REQUEST_BYTES {
        return Err(ReceiveError::TooLarge {
            max: MAX_REQUEST_BYTES,
        });
    }
    Ok(())
}
