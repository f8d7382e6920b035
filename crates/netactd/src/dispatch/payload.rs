//! Semantic type tags used to constrain payloads.

use std::fmt;

use serde_json::Value;

/// Closed set of payload types a slot can be constrained to.
///
/// Tags are checked by inspecting the decoded JSON value. `Null` payloads
/// match no tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadType {
    /// `true` or `false`.
    Boolean,
    /// A JSON number without a fractional part or exponent.
    Integer,
    /// A JSON number that is not an integer.
    Float,
    /// Any JSON number.
    Number,
    /// A JSON string.
    String,
    /// A JSON object or array.
    Structured,
}

impl PayloadType {
    /// Returns `true` when `value` carries this tag.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::Boolean => value.is_boolean(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Float => value.is_f64(),
            Self::Number => value.is_number(),
            Self::String => value.is_string(),
            Self::Structured => value.is_object() || value.is_array(),
        }
    }

    /// Returns the tag carried by `value`, if any.
    ///
    /// Numbers report their most specific tag.
    #[must_use]
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(Self::Boolean),
            Value::Number(number) if number.is_f64() => Some(Self::Float),
            Value::Number(_) => Some(Self::Integer),
            Value::String(_) => Some(Self::String),
            Value::Array(_) | Value::Object(_) => Some(Self::Structured),
        }
    }

    /// Lower-case tag name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Number => "number",
            Self::String => "string",
            Self::Structured => "structured",
        }
    }
}

impl fmt::Display for PayloadType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
