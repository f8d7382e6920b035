//! The closed set of actions a request may name.

use std::fmt;

use super::errors::DispatchError;

/// Actions exposed by the actuation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Adjust a controlled quantity towards a target value.
    Setpoint,
    /// Trigger a discrete actuation.
    Do,
}

impl Action {
    /// Every action, in slot order.
    pub const ALL: [Self; 2] = [Self::Setpoint, Self::Do];

    /// Parses an action name. Matching is exact and case-sensitive.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::InvalidAction` if the value does not name a
    /// known action.
    pub fn parse(value: &str) -> Result<Self, DispatchError> {
        match value {
            "setpoint" => Ok(Self::Setpoint),
            "do" => Ok(Self::Do),
            _ => Err(DispatchError::invalid_action(value)),
        }
    }

    /// Returns the canonical wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Setpoint => "setpoint",
            Self::Do => "do",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Setpoint => 0,
            Self::Do => 1,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
