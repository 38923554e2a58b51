use crate::types::Role;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which external collaborator a failure came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "target", content = "role")]
pub enum CallTarget {
    Agent(Role),
    Clarifier,
}

impl fmt::Display for CallTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallTarget::Agent(role) => role.fmt(f),
            CallTarget::Clarifier => f.write_str("clarifier"),
        }
    }
}

impl From<Role> for CallTarget {
    fn from(role: Role) -> Self {
        CallTarget::Agent(role)
    }
}

/// Coarse error classification, kept on failed sessions for diagnostics
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    Invocation,
    MalformedOutput,
    SessionSuperseded,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DebateError {
    /// Rejected before any state change
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The external call itself failed (transport, HTTP status, envelope)
    #[error("{target} invocation failed: {message}")]
    Invocation { target: CallTarget, message: String },

    /// The call succeeded but its payload does not match the contracted shape
    #[error("{target} returned malformed output: {message}")]
    MalformedOutput { target: CallTarget, message: String },

    /// The session this phase belonged to was reset while the call was in flight
    #[error("session was reset while the phase was in flight; result discarded")]
    SessionSuperseded,
}

impl DebateError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invocation(target: impl Into<CallTarget>, message: impl Into<String>) -> Self {
        Self::Invocation {
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn malformed(target: impl Into<CallTarget>, message: impl Into<String>) -> Self {
        Self::MalformedOutput {
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Invocation { .. } => ErrorKind::Invocation,
            Self::MalformedOutput { .. } => ErrorKind::MalformedOutput,
            Self::SessionSuperseded => ErrorKind::SessionSuperseded,
        }
    }

    pub fn target(&self) -> Option<CallTarget> {
        match self {
            Self::Invocation { target, .. } | Self::MalformedOutput { target, .. } => Some(*target),
            _ => None,
        }
    }
}

pub type DebateResult<T> = std::result::Result<T, DebateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_and_malformed_are_distinct_kinds() {
        let a = DebateError::invocation(Role::Judge, "timeout");
        let b = DebateError::malformed(Role::Judge, "missing summary");

        assert_eq!(a.kind(), ErrorKind::Invocation);
        assert_eq!(b.kind(), ErrorKind::MalformedOutput);
        assert_eq!(a.target(), Some(CallTarget::Agent(Role::Judge)));
        assert_ne!(a.kind(), b.kind());
    }

    #[test]
    fn messages_name_the_role() {
        let err = DebateError::malformed(Role::TieBreaker, "empty ruling");
        assert_eq!(err.to_string(), "tie_breaker returned malformed output: empty ruling");
        assert_eq!(DebateError::invalid_input("idea is empty").target(), None);

        let err = DebateError::malformed(CallTarget::Clarifier, "2 questions");
        assert_eq!(err.to_string(), "clarifier returned malformed output: 2 questions");
    }
}
