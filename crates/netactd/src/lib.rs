//! Network actuation endpoint.
//!
//! The endpoint exposes two callable slots, `setpoint` and `do`, over a
//! strictly alternating request/reply socket. Each slot binds at most one
//! actuator and accumulates validation rules; a request is only handed to the
//! actuator once every rule registered for its slot accepts the payload.
//!
//! Requests and replies are single JSON lines:
//!
//! ```text
//! -> {"action":"do","payload":true}
//! <- {"response":true,"status":200}
//! -> {"action":"do","payload":"testing"}
//! <- {"response":"Request encountered error: Payload does not comply with ruleset","status":200}
//! ```
//!
//! Every request receives a reply. Failures are reported inside the
//! `response` text and, by default, still carry status `200`; see
//! [`StatusMode`] for the typed alternative.
//!
//! Embedding programs use [`NetworkActuation`]; the `netactd` binary wires the
//! same pieces together through [`bootstrap_with`] and [`run`].

mod bootstrap;
mod client;
mod dispatch;
mod process;
mod service;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use client::{ActuationClient, CLIENT_TIMEOUT, ClientError};
pub use dispatch::rules;
pub use dispatch::{
    Action, ActuationDispatcher, ActuationRequest, Actuator, ActuatorError, BoxedActuator,
    BoxedRule, DispatchError, DispatchHandler, ERROR_PREFIX, Echo, PayloadType, ResponseEnvelope,
    ResponseWriter, Rule, RuleError, STATUS_OK, decode_envelope,
};
pub use netact_config::{Config, LogFormat, StatusMode};
pub use process::{LaunchError, run, run_daemon};
pub use service::NetworkActuation;
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{
    ActuationListener, ExchangeHandler, ListenerError, ShutdownError, ShutdownToken, SignalBridge,
};

#[cfg(test)]
mod tests;
