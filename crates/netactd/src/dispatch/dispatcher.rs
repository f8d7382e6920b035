//! Slot table and the resolve-validate-invoke step.

use std::fmt;

use serde_json::Value;
use tracing::debug;

use super::DISPATCH_TARGET;
use super::action::Action;
use super::actuator::{Actuator, BoxedActuator};
use super::errors::DispatchError;
use super::payload::PayloadType;
use super::request::ActuationRequest;
use super::rules::{BoxedRule, TypeConstraint};
use super::slot::Slot;

/// Owns the `setpoint` and `do` slots and dispatches requests to them.
///
/// Registration mutates the slot table and is expected to finish before the
/// listener starts; dispatch only reads it.
pub struct ActuationDispatcher {
    slots: [Slot; 2],
}

impl ActuationDispatcher {
    /// Creates a dispatcher with both slots unbound and no rules.
    pub fn new() -> Self {
        Self {
            slots: Action::ALL.map(Slot::new),
        }
    }

    /// Binds `actuator` to the slot for `action` and appends validation rules.
    ///
    /// The actuator replaces any previous binding. Rules accumulate: a type
    /// constraint, when given, is appended first, followed by `rules` in
    /// order. Previously registered rules are kept.
    pub fn register<A, R>(
        &mut self,
        action: Action,
        actuator: A,
        constraint: Option<PayloadType>,
        rules: R,
    ) where
        A: Actuator + 'static,
        R: IntoIterator<Item = BoxedRule>,
    {
        self.register_boxed(action, Box::new(actuator), constraint, rules);
    }

    /// Same as [`Self::register`] for an actuator that is already boxed.
    pub fn register_boxed<R>(
        &mut self,
        action: Action,
        actuator: BoxedActuator,
        constraint: Option<PayloadType>,
        rules: R,
    ) where
        R: IntoIterator<Item = BoxedRule>,
    {
        let slot = self.slot_mut(action);
        slot.bind(actuator);
        if let Some(tag) = constraint {
            slot.push_rule(Box::new(TypeConstraint(tag)));
        }
        for rule in rules {
            slot.push_rule(rule);
        }
        debug!(
            target: DISPATCH_TARGET,
            action = action.as_str(),
            rules = slot.rule_count(),
            "actuator registered"
        );
    }

    /// Registers the `setpoint` actuator. See [`Self::register`].
    pub fn register_setpoint<A, R>(&mut self, actuator: A, constraint: Option<PayloadType>, rules: R)
    where
        A: Actuator + 'static,
        R: IntoIterator<Item = BoxedRule>,
    {
        self.register(Action::Setpoint, actuator, constraint, rules);
    }

    /// Registers the `do` actuator. See [`Self::register`].
    pub fn register_do<A, R>(&mut self, actuator: A, constraint: Option<PayloadType>, rules: R)
    where
        A: Actuator + 'static,
        R: IntoIterator<Item = BoxedRule>,
    {
        self.register(Action::Do, actuator, constraint, rules);
    }

    /// Returns whether an actuator is bound for `action`.
    pub fn is_bound(&self, action: Action) -> bool {
        self.slot(action).is_bound()
    }

    /// Number of rules accumulated for `action`.
    pub fn rule_count(&self, action: Action) -> usize {
        self.slot(action).rule_count()
    }

    /// Resolves, validates, and invokes a decoded request envelope.
    ///
    /// # Errors
    ///
    /// Returns `MalformedRequest` when `action` or `payload` is missing,
    /// `InvalidAction` for unknown actions, `UnboundSlot` when no actuator is
    /// registered, `RuleEvaluation` or `ValidationFailed` when the payload
    /// does not pass the slot's rules, and `ActuatorFailed` when the actuator
    /// reports an error.
    pub fn dispatch(&self, envelope: &Value) -> Result<Value, DispatchError> {
        let request = ActuationRequest::from_envelope(envelope)?;
        self.invoke(&request)
    }

    /// Validates and invokes an already resolved request.
    ///
    /// # Errors
    ///
    /// See [`Self::dispatch`]; request-shape errors cannot occur here.
    pub fn invoke(&self, request: &ActuationRequest<'_>) -> Result<Value, DispatchError> {
        debug!(
            target: DISPATCH_TARGET,
            action = request.action().as_str(),
            "dispatching request"
        );
        self.slot(request.action()).invoke(request.payload())
    }

    fn slot(&self, action: Action) -> &Slot {
        &self.slots[action.index()]
    }

    fn slot_mut(&mut self, action: Action) -> &mut Slot {
        &mut self.slots[action.index()]
    }
}

impl Default for ActuationDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ActuationDispatcher {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = formatter.debug_struct("ActuationDispatcher");
        for action in Action::ALL {
            let slot = self.slot(action);
            debug.field(
                action.as_str(),
                &format_args!("bound={} rules={}", slot.is_bound(), slot.rule_count()),
            );
        }
        debug.finish()
    }
}
