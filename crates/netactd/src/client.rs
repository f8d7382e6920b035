//! Request-side helper for talking to an actuation endpoint.
//!
//! The client keeps one connection open and performs strictly alternating
//! exchanges: each call writes one request line and blocks for one reply.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use serde_json::{Value, json};
use thiserror::Error;

use crate::dispatch::{Action, ResponseEnvelope};

/// Timeout applied when connecting and when waiting for a reply.
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors surfaced by [`ActuationClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The endpoint address did not resolve.
    #[error("failed to resolve {endpoint}: {source}")]
    Resolve {
        /// Endpoint as given by the caller.
        endpoint: String,
        /// Underlying resolver error.
        #[source]
        source: io::Error,
    },
    /// Connecting to the endpoint failed.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        /// Resolved address.
        address: SocketAddr,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Writing a request or reading a reply failed.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
    /// The endpoint closed the connection before replying.
    #[error("endpoint closed the connection before replying")]
    Closed,
    /// The reply was not a response envelope.
    #[error("invalid reply: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Blocking client holding one connection to an endpoint.
#[derive(Debug)]
pub struct ActuationClient {
    writer: TcpStream,
    reader: BufReader<TcpStream>,
}

impl ActuationClient {
    /// Connects to `host:port`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Resolve`] or [`ClientError::Connect`] when the
    /// endpoint cannot be reached.
    pub fn connect(host: &str, port: u16) -> Result<Self, ClientError> {
        let address = resolve(host, port)?;
        let stream = TcpStream::connect_timeout(&address, CLIENT_TIMEOUT)
            .map_err(|source| ClientError::Connect { address, source })?;
        stream.set_read_timeout(Some(CLIENT_TIMEOUT))?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self {
            writer: stream,
            reader,
        })
    }

    /// Sends `payload` to the slot for `action` and waits for the reply.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the exchange fails at the transport
    /// level. Dispatch failures arrive as ordinary envelopes.
    pub fn request(
        &mut self,
        action: Action,
        payload: Value,
    ) -> Result<ResponseEnvelope, ClientError> {
        self.send(&json!({"action": action.as_str(), "payload": payload}))
    }

    /// Sends an arbitrary JSON document as one request line.
    ///
    /// # Errors
    ///
    /// See [`Self::request`].
    pub fn send(&mut self, document: &Value) -> Result<ResponseEnvelope, ClientError> {
        self.send_raw(&document.to_string())
    }

    /// Sends `line` verbatim, appending the newline delimiter.
    ///
    /// # Errors
    ///
    /// See [`Self::request`].
    pub fn send_raw(&mut self, line: &str) -> Result<ResponseEnvelope, ClientError> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;

        let mut reply = String::new();
        if self.reader.read_line(&mut reply)? == 0 {
            return Err(ClientError::Closed);
        }
        Ok(serde_json::from_str(reply.trim_end())?)
    }
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr, ClientError> {
    let endpoint = format!("{host}:{port}");
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ClientError::Resolve {
            endpoint: endpoint.clone(),
            source,
        })?;
    addrs.next().ok_or_else(|| ClientError::Resolve {
        endpoint,
        source: io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses"),
    })
}
