//! Programmatic facade over the dispatcher and listener.
//!
//! [`NetworkActuation`] bundles the two slots with the listener settings so
//! an embedding program can register its actuators and then block in
//! [`NetworkActuation::listen`]:
//!
//! ```rust,no_run
//! use netactd::{Echo, NetworkActuation, PayloadType, ShutdownToken};
//!
//! let mut service = NetworkActuation::new(None, None, None);
//! service.register_do(Echo, Some(PayloadType::Boolean), Vec::new());
//! service.listen(None, &ShutdownToken::new())?;
//! # Ok::<(), netactd::ListenerError>(())
//! ```

use std::time::Duration;

use netact_config::{Config, DEFAULT_HOST, DEFAULT_IDLE_TIMEOUT_MS, DEFAULT_PORT, StatusMode};

use crate::dispatch::{
    Action, ActuationDispatcher, Actuator, BoxedActuator, BoxedRule, DispatchHandler, PayloadType,
};
use crate::transport::{ActuationListener, ListenerError, ShutdownToken};

/// Actuation endpoint with a `setpoint` slot and a `do` slot.
pub struct NetworkActuation {
    dispatcher: ActuationDispatcher,
    host: String,
    port: u16,
    status_mode: StatusMode,
    idle_timeout: Duration,
}

impl NetworkActuation {
    /// Creates an endpoint, optionally binding actuators to either slot.
    ///
    /// Actuators given here carry no rules. `port` defaults to `26462`.
    pub fn new(
        setpoint: Option<BoxedActuator>,
        do_actuator: Option<BoxedActuator>,
        port: Option<u16>,
    ) -> Self {
        let mut service = Self {
            dispatcher: ActuationDispatcher::new(),
            host: DEFAULT_HOST.to_owned(),
            port: port.unwrap_or(DEFAULT_PORT),
            status_mode: StatusMode::default(),
            idle_timeout: Duration::from_millis(DEFAULT_IDLE_TIMEOUT_MS),
        };
        for (action, actuator) in [(Action::Setpoint, setpoint), (Action::Do, do_actuator)] {
            if let Some(actuator) = actuator {
                service
                    .dispatcher
                    .register_boxed(action, actuator, None, Vec::new());
            }
        }
        service
    }

    /// Creates an unbound endpoint using the listener settings in `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(None, None, Some(config.port()))
            .with_host(config.host())
            .with_status_mode(config.status_mode())
            .with_idle_timeout(config.idle_timeout())
    }

    /// Binds the `setpoint` actuator without adding rules.
    #[must_use]
    pub fn with_setpoint<A>(mut self, actuator: A) -> Self
    where
        A: Actuator + 'static,
    {
        self.register_setpoint(actuator, None, Vec::new());
        self
    }

    /// Binds the `do` actuator without adding rules.
    #[must_use]
    pub fn with_do<A>(mut self, actuator: A) -> Self
    where
        A: Actuator + 'static,
    {
        self.register_do(actuator, None, Vec::new());
        self
    }

    /// Sets the default port used by [`Self::listen`].
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the interface the listener binds to.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets how the `status` field of replies is populated.
    #[must_use]
    pub fn with_status_mode(mut self, mode: StatusMode) -> Self {
        self.status_mode = mode;
        self
    }

    /// Sets how long a client may stay silent between requests before its
    /// connection is closed.
    #[must_use]
    pub const fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Binds the `setpoint` actuator and appends rules.
    ///
    /// See [`ActuationDispatcher::register`] for the accumulation rules.
    pub fn register_setpoint<A, R>(&mut self, actuator: A, constraint: Option<PayloadType>, rules: R)
    where
        A: Actuator + 'static,
        R: IntoIterator<Item = BoxedRule>,
    {
        self.dispatcher
            .register(Action::Setpoint, actuator, constraint, rules);
    }

    /// Binds the `do` actuator and appends rules.
    ///
    /// See [`ActuationDispatcher::register`] for the accumulation rules.
    pub fn register_do<A, R>(&mut self, actuator: A, constraint: Option<PayloadType>, rules: R)
    where
        A: Actuator + 'static,
        R: IntoIterator<Item = BoxedRule>,
    {
        self.dispatcher.register(Action::Do, actuator, constraint, rules);
    }

    /// The slot table backing this endpoint.
    #[must_use]
    pub const fn dispatcher(&self) -> &ActuationDispatcher {
        &self.dispatcher
    }

    /// Interface the listener binds to.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port used when [`Self::listen`] is called without one.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Status policy applied to replies.
    #[must_use]
    pub const fn status_mode(&self) -> StatusMode {
        self.status_mode
    }

    /// Idle timeout applied to each client connection.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Binds the listening socket without serving it.
    ///
    /// # Errors
    ///
    /// Returns a [`ListenerError`] if the address cannot be bound.
    pub fn bind(&self, port: Option<u16>) -> Result<ActuationListener, ListenerError> {
        ActuationListener::bind(&self.host, port.unwrap_or(self.port))
            .map(|listener| listener.with_idle_timeout(self.idle_timeout))
    }

    /// Serves an already bound listener until `shutdown` is cancelled.
    pub fn serve(&self, listener: ActuationListener, shutdown: &ShutdownToken) {
        let handler = DispatchHandler::new(&self.dispatcher, self.status_mode);
        listener.serve(&handler, shutdown);
    }

    /// Binds `port` (or the configured port) and serves requests until
    /// `shutdown` is cancelled. The socket is released before returning.
    ///
    /// # Errors
    ///
    /// Returns a [`ListenerError`] if the address cannot be bound. Errors in
    /// individual requests are answered and never returned.
    pub fn listen(&self, port: Option<u16>, shutdown: &ShutdownToken) -> Result<(), ListenerError> {
        let listener = self.bind(port)?;
        self.serve(listener, shutdown);
        Ok(())
    }
}

impl Default for NetworkActuation {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}

impl std::fmt::Debug for NetworkActuation {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("NetworkActuation")
            .field("dispatcher", &self.dispatcher)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("status_mode", &self.status_mode)
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}
