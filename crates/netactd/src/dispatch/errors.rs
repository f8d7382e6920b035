//! Error types for request dispatch failures.
//!
//! Every variant is rendered into a response envelope at the request
//! boundary; none of them terminates the listener. The display strings of the
//! request-shape errors are part of the wire contract and must not change.

use thiserror::Error;

use super::action::Action;

/// Errors surfaced while decoding, validating, or invoking a request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A required envelope field is missing or the bytes are not a request.
    #[error("{message}")]
    MalformedRequest {
        /// Message sent back to the client.
        message: String,
        /// JSON decoding error, when the bytes failed to parse.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The action name is outside `{setpoint, do}`.
    #[error("Not a valid action")]
    InvalidAction {
        /// Action name as sent by the client.
        action: String,
    },

    /// The action resolved to a slot without a registered actuator.
    #[error("No function registered for action '{action}'")]
    UnboundSlot {
        /// Slot that has no actuator.
        action: Action,
    },

    /// At least one rule rejected the payload.
    #[error("Payload does not comply with ruleset")]
    ValidationFailed {
        /// Slot whose rules rejected the payload.
        action: Action,
    },

    /// A rule could not evaluate the payload.
    #[error("Rule {index} could not evaluate payload: {message}")]
    RuleEvaluation {
        /// Position of the failing rule in the slot's rule list.
        index: usize,
        /// Reason reported by the rule.
        message: String,
    },

    /// The bound actuator reported a failure.
    #[error("Actuator for '{action}' failed: {message}")]
    ActuatorFailed {
        /// Slot whose actuator failed.
        action: Action,
        /// Reason reported by the actuator.
        message: String,
    },
}

impl DispatchError {
    /// Returns the status code reported when typed statuses are enabled.
    ///
    /// Shape errors map to 400, unknown actions to 404, payload rejections to
    /// 422, a missing actuator to 503 and actuator failures to 500.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::MalformedRequest { .. } => 400,
            Self::InvalidAction { .. } => 404,
            Self::ValidationFailed { .. } | Self::RuleEvaluation { .. } => 422,
            Self::ActuatorFailed { .. } => 500,
            Self::UnboundSlot { .. } => 503,
        }
    }

    /// Stable identifier for the error kind, used in telemetry.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MalformedRequest { .. } => "malformed_request",
            Self::InvalidAction { .. } => "invalid_action",
            Self::UnboundSlot { .. } => "unbound_slot",
            Self::ValidationFailed { .. } => "validation_failed",
            Self::RuleEvaluation { .. } => "rule_evaluation",
            Self::ActuatorFailed { .. } => "actuator_failed",
        }
    }

    /// Creates a malformed request error from a serde error.
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::MalformedRequest {
            message: format!("Request is not valid JSON: {source}"),
            source: Some(source),
        }
    }

    /// Creates a malformed request error with a custom message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an invalid action error.
    pub fn invalid_action(action: impl Into<String>) -> Self {
        Self::InvalidAction {
            action: action.into(),
        }
    }

    /// Creates a rule evaluation error for the rule at `index`.
    pub fn rule_evaluation(index: usize, message: impl Into<String>) -> Self {
        Self::RuleEvaluation {
            index,
            message: message.into(),
        }
    }

    /// Creates an actuator failure error.
    pub fn actuator_failed(action: Action, message: impl Into<String>) -> Self {
        Self::ActuatorFailed {
            action,
            message: message.into(),
        }
    }
}
