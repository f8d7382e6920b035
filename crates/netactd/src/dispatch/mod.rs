//! Request dispatch and payload validation.
//!
//! The dispatcher owns two slots, `setpoint` and `do`. Each slot holds at
//! most one actuator and an accumulating list of rules. A request names a
//! slot and carries a payload:
//!
//! ```json
//! {"action":"do","payload":true}
//! ```
//!
//! Dispatch checks the envelope, resolves the slot, evaluates every rule
//! against the payload, and only then invokes the actuator. The outcome is
//! rendered as a single response line:
//!
//! ```json
//! {"response":true,"status":200}
//! ```

mod action;
mod actuator;
mod dispatcher;
mod errors;
mod handler;
mod payload;
mod request;
mod response;
pub mod rules;
mod slot;

pub use self::action::Action;
pub use self::actuator::{Actuator, ActuatorError, BoxedActuator, Echo};
pub use self::dispatcher::ActuationDispatcher;
pub use self::errors::DispatchError;
pub use self::handler::DispatchHandler;
pub use self::payload::PayloadType;
pub use self::request::{ActuationRequest, decode_envelope};
pub use self::response::{ERROR_PREFIX, ResponseEnvelope, ResponseWriter, STATUS_OK};
pub use self::rules::{BoxedRule, Rule, RuleError};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
