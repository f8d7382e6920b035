//! Request decoding for the dispatch loop.
//!
//! A request line is a single JSON object:
//!
//! ```json
//! {"action":"setpoint","payload":21.5}
//! ```
//!
//! Decoding happens in two stages. [`decode_envelope`] turns raw bytes into a
//! JSON document; [`ActuationRequest::from_envelope`] then checks the envelope
//! fields in the order clients rely on for error reporting.

use serde_json::{Map, Value};

use super::action::Action;
use super::errors::DispatchError;

const ACTION_FIELD: &str = "action";
const PAYLOAD_FIELD: &str = "payload";

/// Parses a request line into a JSON document.
///
/// Trailing whitespace (including the newline delimiter) is trimmed before
/// parsing.
///
/// # Errors
///
/// Returns `DispatchError::MalformedRequest` if the line is empty or is not
/// valid JSON.
pub fn decode_envelope(line: &[u8]) -> Result<Value, DispatchError> {
    let trimmed = trim_trailing_whitespace(line);
    if trimmed.is_empty() {
        return Err(DispatchError::malformed("Empty request"));
    }

    serde_json::from_slice(trimmed).map_err(DispatchError::from_json_error)
}

/// A request whose envelope has been checked and whose action is known.
#[derive(Debug, Clone, Copy)]
pub struct ActuationRequest<'a> {
    action: Action,
    payload: &'a Value,
}

impl<'a> ActuationRequest<'a> {
    /// Creates a request from its parts.
    pub fn new(action: Action, payload: &'a Value) -> Self {
        Self { action, payload }
    }

    /// Checks the envelope fields and resolves the action.
    ///
    /// A `null` payload counts as present; only an absent key is rejected.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::MalformedRequest` if the envelope is not an
    /// object or lacks `action` or `payload` (checked in that order), and
    /// `DispatchError::InvalidAction` if the action is not a known name.
    pub fn from_envelope(envelope: &'a Value) -> Result<Self, DispatchError> {
        let fields = as_object(envelope)?;
        let Some(action) = fields.get(ACTION_FIELD) else {
            return Err(DispatchError::malformed("No action declared"));
        };
        let Some(payload) = fields.get(PAYLOAD_FIELD) else {
            return Err(DispatchError::malformed("No target object specified"));
        };

        let action = match action {
            Value::String(name) => Action::parse(name)?,
            other => return Err(DispatchError::invalid_action(other.to_string())),
        };

        Ok(Self::new(action, payload))
    }

    /// The resolved action.
    pub fn action(&self) -> Action {
        self.action
    }

    /// The payload handed to rules and the actuator.
    pub fn payload(&self) -> &'a Value {
        self.payload
    }
}

fn as_object(envelope: &Value) -> Result<&Map<String, Value>, DispatchError> {
    envelope
        .as_object()
        .ok_or_else(|| DispatchError::malformed("Request must be a JSON object"))
}

/// Trims trailing ASCII whitespace from a byte slice.
fn trim_trailing_whitespace(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |pos| pos + 1);
    &bytes[..end]
}
