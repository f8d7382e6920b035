//! Validation rules gating actuator invocation.
//!
//! A rule judges a single payload value. Rules registered on a slot are all
//! evaluated, in insertion order, and the payload is accepted only when every
//! rule accepts it. Evaluation is fallible: a rule that cannot judge the
//! payload at all (a numeric bound handed a string, say) reports a
//! [`RuleError`] rather than a verdict.
//!
//! Closures of the form `Fn(&Value) -> Result<bool, RuleError>` are rules.
//! Infallible predicates can be wrapped with [`predicate`].

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use super::payload::PayloadType;

/// A rule that could not produce a verdict for a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RuleError {
    message: String,
}

impl RuleError {
    /// Creates a rule error with a custom message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Creates an error for a payload whose type the rule cannot judge.
    pub fn unexpected_type(expected: PayloadType, payload: &Value) -> Self {
        let actual = PayloadType::of(payload).map_or("null", PayloadType::as_str);
        Self::new(format!("expected {expected} payload, got {actual}"))
    }

    /// Human-readable description of the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A predicate over a payload value.
pub trait Rule: Send + Sync {
    /// Returns whether the payload satisfies the rule.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleError`] when the rule cannot judge this payload.
    fn evaluate(&self, payload: &Value) -> Result<bool, RuleError>;
}

/// Owned, type-erased rule as stored in a slot.
pub type BoxedRule = Box<dyn Rule>;

impl<F> Rule for F
where
    F: Fn(&Value) -> Result<bool, RuleError> + Send + Sync,
{
    fn evaluate(&self, payload: &Value) -> Result<bool, RuleError> {
        self(payload)
    }
}

/// Accepts payloads carrying the given type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeConstraint(pub PayloadType);

impl Rule for TypeConstraint {
    fn evaluate(&self, payload: &Value) -> Result<bool, RuleError> {
        Ok(self.0.matches(payload))
    }
}

/// Comparison applied by a [`Bound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Strictly less than the limit.
    LessThan,
    /// Less than or equal to the limit.
    AtMost,
    /// Strictly greater than the limit.
    GreaterThan,
    /// Greater than or equal to the limit.
    AtLeast,
}

impl fmt::Display for Comparison {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::LessThan => "<",
            Self::AtMost => "<=",
            Self::GreaterThan => ">",
            Self::AtLeast => ">=",
        })
    }
}

/// Compares a numeric payload against a fixed limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    comparison: Comparison,
    limit: f64,
}

impl Bound {
    /// Creates a bound from an explicit comparison.
    #[must_use]
    pub const fn new(comparison: Comparison, limit: f64) -> Self {
        Self { comparison, limit }
    }
}

impl Rule for Bound {
    fn evaluate(&self, payload: &Value) -> Result<bool, RuleError> {
        let value = numeric(payload)?;
        Ok(match self.comparison {
            Comparison::LessThan => value < self.limit,
            Comparison::AtMost => value <= self.limit,
            Comparison::GreaterThan => value > self.limit,
            Comparison::AtLeast => value >= self.limit,
        })
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "payload {} {}", self.comparison, self.limit)
    }
}

/// Accepts numeric payloads in the closed interval `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Between {
    low: f64,
    high: f64,
}

impl Rule for Between {
    fn evaluate(&self, payload: &Value) -> Result<bool, RuleError> {
        let value = numeric(payload)?;
        Ok(self.low <= value && value <= self.high)
    }
}

/// Accepts payloads equal to one of a fixed set of values.
#[derive(Debug, Clone, PartialEq)]
pub struct OneOf(Vec<Value>);

impl Rule for OneOf {
    fn evaluate(&self, payload: &Value) -> Result<bool, RuleError> {
        Ok(self.0.iter().any(|allowed| allowed == payload))
    }
}

/// Wraps an infallible predicate.
pub struct Predicate<F>(F);

impl<F> Rule for Predicate<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn evaluate(&self, payload: &Value) -> Result<bool, RuleError> {
        Ok((self.0)(payload))
    }
}

impl<F> fmt::Debug for Predicate<F> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("Predicate")
    }
}

/// Payload must be strictly less than `limit`.
#[must_use]
pub const fn less_than(limit: f64) -> Bound {
    Bound::new(Comparison::LessThan, limit)
}

/// Payload must be less than or equal to `limit`.
#[must_use]
pub const fn at_most(limit: f64) -> Bound {
    Bound::new(Comparison::AtMost, limit)
}

/// Payload must be strictly greater than `limit`.
#[must_use]
pub const fn greater_than(limit: f64) -> Bound {
    Bound::new(Comparison::GreaterThan, limit)
}

/// Payload must be greater than or equal to `limit`.
#[must_use]
pub const fn at_least(limit: f64) -> Bound {
    Bound::new(Comparison::AtLeast, limit)
}

/// Payload must lie within `[low, high]`.
#[must_use]
pub const fn between(low: f64, high: f64) -> Between {
    Between { low, high }
}

/// Payload must equal one of `values`.
pub fn one_of(values: impl IntoIterator<Item = Value>) -> OneOf {
    OneOf(values.into_iter().collect())
}

/// Boxes a rule for registration, so rules of different types can share one
/// list: `vec![rules::boxed(less_than(10.0)), rules::boxed(one_of(...))]`.
#[must_use]
pub fn boxed<R>(rule: R) -> BoxedRule
where
    R: Rule + 'static,
{
    Box::new(rule)
}

/// Lifts an infallible predicate into a rule.
pub fn predicate<F>(check: F) -> Predicate<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    Predicate(check)
}

fn numeric(payload: &Value) -> Result<f64, RuleError> {
    payload
        .as_f64()
        .ok_or_else(|| RuleError::unexpected_type(PayloadType::Number, payload))
}
