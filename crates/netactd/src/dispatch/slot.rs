//! Per-action slot holding the bound actuator and its accumulated rules.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;

use super::action::Action;
use super::actuator::BoxedActuator;
use super::errors::DispatchError;
use super::rules::{BoxedRule, RuleError};

pub(crate) struct Slot {
    action: Action,
    actuator: Option<BoxedActuator>,
    rules: Vec<BoxedRule>,
}

impl Slot {
    pub(crate) fn new(action: Action) -> Self {
        Self {
            action,
            actuator: None,
            rules: Vec::new(),
        }
    }

    /// Replaces the bound actuator. Rules are left untouched.
    pub(crate) fn bind(&mut self, actuator: BoxedActuator) {
        self.actuator = Some(actuator);
    }

    pub(crate) fn push_rule(&mut self, rule: BoxedRule) {
        self.rules.push(rule);
    }

    pub(crate) fn is_bound(&self) -> bool {
        self.actuator.is_some()
    }

    pub(crate) fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Validates `payload` and, when every rule accepts it, invokes the
    /// actuator.
    pub(crate) fn invoke(&self, payload: &Value) -> Result<Value, DispatchError> {
        let Some(actuator) = self.actuator.as_ref() else {
            return Err(DispatchError::UnboundSlot {
                action: self.action,
            });
        };

        self.validate(payload)?;

        match panic::catch_unwind(AssertUnwindSafe(|| actuator.actuate(payload))) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(DispatchError::actuator_failed(self.action, error.message())),
            Err(cause) => Err(DispatchError::actuator_failed(
                self.action,
                panic_message(cause.as_ref()),
            )),
        }
    }

    /// Evaluates every rule, without short-circuiting, and AND-reduces the
    /// verdicts. A rule that cannot judge the payload takes precedence over
    /// plain rejections.
    fn validate(&self, payload: &Value) -> Result<(), DispatchError> {
        let verdicts: Vec<Result<bool, RuleError>> = self
            .rules
            .iter()
            .map(|rule| evaluate_guarded(rule, payload))
            .collect();

        if let Some((index, error)) = verdicts
            .iter()
            .enumerate()
            .find_map(|(index, verdict)| verdict.as_ref().err().map(|error| (index, error)))
        {
            return Err(DispatchError::rule_evaluation(index, error.message()));
        }

        if verdicts.iter().all(|verdict| matches!(verdict, Ok(true))) {
            Ok(())
        } else {
            Err(DispatchError::ValidationFailed {
                action: self.action,
            })
        }
    }
}

fn evaluate_guarded(rule: &BoxedRule, payload: &Value) -> Result<bool, RuleError> {
    panic::catch_unwind(AssertUnwindSafe(|| rule.evaluate(payload)))
        .unwrap_or_else(|cause| Err(RuleError::new(panic_message(cause.as_ref()))))
}

fn panic_message(cause: &(dyn Any + Send)) -> String {
    if let Some(message) = cause.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = cause.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::dispatch::actuator::{ActuatorError, Echo};
    use crate::dispatch::rules::{Rule, less_than, predicate};

    struct CountingRule {
        calls: Arc<AtomicUsize>,
        verdict: bool,
    }

    impl Rule for CountingRule {
        fn evaluate(&self, _payload: &Value) -> Result<bool, RuleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.verdict)
        }
    }

    #[test]
    fn unbound_slot_is_reported() {
        let slot = Slot::new(Action::Setpoint);
        let error = slot.invoke(&json!(1)).expect_err("slot has no actuator");
        assert!(matches!(
            error,
            DispatchError::UnboundSlot {
                action: Action::Setpoint
            }
        ));
    }

    #[test]
    fn every_rule_runs_even_after_a_rejection() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut slot = Slot::new(Action::Do);
        slot.bind(Box::new(Echo));
        for verdict in [false, true, true] {
            slot.push_rule(Box::new(CountingRule {
                calls: Arc::clone(&calls),
                verdict,
            }));
        }

        let error = slot.invoke(&json!(1)).expect_err("first rule rejects");
        assert!(matches!(error, DispatchError::ValidationFailed { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn failing_rule_is_reported_with_its_index() {
        let mut slot = Slot::new(Action::Setpoint);
        slot.bind(Box::new(Echo));
        slot.push_rule(Box::new(predicate(|_: &Value| false)));
        slot.push_rule(Box::new(less_than(10.0)));

        let error = slot.invoke(&json!("warm")).expect_err("bound cannot judge text");
        match error {
            DispatchError::RuleEvaluation { index, message } => {
                assert_eq!(index, 1);
                assert!(message.contains("expected number"), "{message}");
            }
            other => panic!("expected rule evaluation error, got {other:?}"),
        }
    }

    #[test]
    fn panicking_rule_is_contained() {
        let mut slot = Slot::new(Action::Do);
        slot.bind(Box::new(Echo));
        slot.push_rule(Box::new(|_: &Value| -> Result<bool, RuleError> {
            panic!("rule exploded")
        }));

        let error = slot.invoke(&json!(true)).expect_err("rule panicked");
        match error {
            DispatchError::RuleEvaluation { message, .. } => {
                assert!(message.contains("rule exploded"), "{message}");
            }
            other => panic!("expected rule evaluation error, got {other:?}"),
        }
    }

    #[test]
    fn actuator_errors_are_reported() {
        let mut slot = Slot::new(Action::Setpoint);
        slot.bind(Box::new(|_: &Value| -> Result<Value, ActuatorError> {
            Err(ActuatorError::new("valve stuck"))
        }));

        let error = slot.invoke(&json!(3)).expect_err("actuator fails");
        assert_eq!(error.to_string(), "Actuator for 'setpoint' failed: valve stuck");
    }

    #[test]
    fn panicking_actuator_is_contained() {
        let mut slot = Slot::new(Action::Do);
        slot.bind(Box::new(|_: &Value| -> Result<Value, ActuatorError> {
            panic!("boom")
        }));

        let error = slot.invoke(&json!(true)).expect_err("actuator panicked");
        assert!(matches!(
            error,
            DispatchError::ActuatorFailed {
                action: Action::Do,
                ..
            }
        ));
        assert_eq!(error.to_string(), "Actuator for 'do' failed: panicked: boom");
    }
}
