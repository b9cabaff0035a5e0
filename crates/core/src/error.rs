//! Typed error types for code parsing, assembly, and traversal.

use std::fmt;

/// Failures surfaced by the codec.
///
/// A lookup miss is never an error: every accessor returns `Option` for that.
/// Ordinals are `usize`, so a negative code index cannot be expressed at all.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeError {
    /// The token text lacks the `[CQ:` head or `]` terminator, or its type is unusable.
    #[error("malformed code {token:?}: {reason}")]
    Malformed {
        /// The offending token text, as given by the caller.
        token: String,
        /// What exactly was wrong with it.
        reason: MalformedReason,
    },

    /// A programmatically supplied type is empty or contains a reserved character.
    #[error("invalid code type {0:?}")]
    InvalidType(String),

    /// A programmatically supplied parameter key contains a reserved character
    /// or surrounding whitespace.
    #[error("invalid parameter key {0:?}")]
    InvalidKey(String),

    /// `try_next` was called on a parameter iterator with nothing left.
    #[error("parameter iterator exhausted")]
    IteratorExhausted,
}

impl CodeError {
    pub(crate) fn malformed(token: &str, reason: MalformedReason) -> Self {
        tracing::debug!(token, %reason, "rejecting malformed code");
        CodeError::Malformed {
            token: token.to_string(),
            reason,
        }
    }

    /// Whether this error came from parsing token text (as opposed to assembly
    /// or iteration misuse).
    pub fn is_malformed(&self) -> bool {
        matches!(self, CodeError::Malformed { .. })
    }
}

/// Why a token failed framing validation.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// The text does not start with `[CQ:`.
    MissingHead,
    /// The text does not end with `]`.
    MissingTerminator,
    /// Nothing between the head and the first separator.
    EmptyType,
    /// The type contains `=` or `]`.
    ReservedCharInType,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::MissingHead => write!(f, "missing '[CQ:' head"),
            MalformedReason::MissingTerminator => write!(f, "missing ']' terminator"),
            MalformedReason::EmptyType => write!(f, "empty code type"),
            MalformedReason::ReservedCharInType => write!(f, "reserved character in code type"),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CodeError>;
