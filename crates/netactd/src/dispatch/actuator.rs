//! Actuator functions bound to dispatch slots.

use serde_json::Value;
use thiserror::Error;

/// Failure reported by an actuator while acting on a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ActuatorError {
    message: String,
}

impl ActuatorError {
    /// Creates an actuator error with a message for the client.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Human-readable description of the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A single-argument function invoked with a validated payload.
///
/// Any `Fn(&Value) -> Result<Value, ActuatorError>` closure is an actuator.
pub trait Actuator: Send + Sync {
    /// Acts on the payload and returns the value sent back to the client.
    ///
    /// # Errors
    ///
    /// Returns an [`ActuatorError`] when the actuation cannot be carried out.
    fn actuate(&self, payload: &Value) -> Result<Value, ActuatorError>;
}

/// Owned, type-erased actuator as stored in a slot.
pub type BoxedActuator = Box<dyn Actuator>;

impl<F> Actuator for F
where
    F: Fn(&Value) -> Result<Value, ActuatorError> + Send + Sync,
{
    fn actuate(&self, payload: &Value) -> Result<Value, ActuatorError> {
        self(payload)
    }
}

/// Actuator that returns its payload unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct Echo;

impl Actuator for Echo {
    fn actuate(&self, payload: &Value) -> Result<Value, ActuatorError> {
        Ok(payload.clone())
    }
}
