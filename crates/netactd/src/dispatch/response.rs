//! Response serialization helpers for the dispatch loop.
//!
//! Every request receives exactly one response line:
//!
//! ```json
//! {"response":true,"status":200}
//! {"response":"Request encountered error: Not a valid action","status":200}
//! ```
//!
//! In [`StatusMode::Compat`] the status is always `200` and failures are only
//! visible in the `response` text. [`StatusMode::Typed`] reports
//! [`DispatchError::status_code`] instead.

use std::io::{self, Write};

use netact_config::StatusMode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::DispatchError;

/// Status reported for successful requests, and for every request in
/// compatibility mode.
pub const STATUS_OK: u16 = 200;

/// Prefix prepended to error messages placed in the `response` field.
pub const ERROR_PREFIX: &str = "Request encountered error: ";

/// Response document sent back for each request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// The actuator result, or an error message.
    pub response: Value,
    /// Status code; see [`StatusMode`].
    pub status: u16,
}

impl ResponseEnvelope {
    /// Wraps a successful actuator result.
    #[must_use]
    pub const fn success(response: Value) -> Self {
        Self {
            response,
            status: STATUS_OK,
        }
    }

    /// Renders a dispatch failure according to `mode`.
    #[must_use]
    pub fn failure(error: &DispatchError, mode: StatusMode) -> Self {
        let status = match mode {
            StatusMode::Compat => STATUS_OK,
            StatusMode::Typed => error.status_code(),
        };
        Self {
            response: Value::String(format!("{ERROR_PREFIX}{error}")),
            status,
        }
    }

    /// Builds the envelope for a dispatch outcome.
    #[must_use]
    pub fn from_outcome(outcome: &Result<Value, DispatchError>, mode: StatusMode) -> Self {
        match outcome {
            Ok(value) => Self::success(value.clone()),
            Err(error) => Self::failure(error, mode),
        }
    }

    /// Returns the error message when this envelope reports a failure.
    ///
    /// Only meaningful for envelopes produced by this crate; a successful
    /// actuator could legitimately return a string with the same prefix.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.response.as_str()?.strip_prefix(ERROR_PREFIX)
    }
}

/// Writer that serializes response envelopes as JSONL.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Creates a new response writer wrapping the given output stream.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes an envelope as one line and flushes the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, writing, or flushing fails.
    pub fn write_envelope(&mut self, envelope: &ResponseEnvelope) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, envelope)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}
