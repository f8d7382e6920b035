//! Response status policy.
//!
//! Deployed clients of the actuation endpoint only ever inspect the
//! `response` field, because every reply historically carried status `200`.
//! [`StatusMode::Compat`] keeps that wire contract. [`StatusMode::Typed`] is
//! an opt-in, non-compatible variant that reports a distinct status per
//! failure kind.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How response envelopes populate their `status` field.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StatusMode {
    /// Always report `200`; failures are only visible in the `response` text.
    #[default]
    Compat,
    /// Report an HTTP-style status code per failure kind.
    Typed,
}

/// Errors encountered while parsing a [`StatusMode`] from text.
pub type StatusModeParseError = strum::ParseError;
