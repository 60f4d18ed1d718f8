use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Terminal failure signal carried by every sequence
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    /// A single-shot source was pulled after it had already handed out its element.
    #[error("fragile source pulled {pulls} times, only 1 pull is allowed")]
    OverPulled { pulls: usize },

    #[error("predicate failed: {0}")]
    Predicate(String),

    #[error("upstream failed: {0}")]
    Upstream(String),
}

impl SequenceError {
    pub fn predicate(message: impl Into<String>) -> Self {
        Self::Predicate(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }
}

// =============================================================================
// Assertion mismatches reported by the step verifier
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerifyError {
    #[error("step {step}: expected next value {expected}, got {actual}")]
    UnexpectedValue {
        step: usize,
        expected: String,
        actual: String,
    },

    #[error("step {step}: value {actual} does not match '{description}'")]
    PredicateFailed {
        step: usize,
        description: String,
        actual: String,
    },

    #[error("step {step}: sequence completed before the expectation was met")]
    UnexpectedComplete { step: usize },

    #[error("step {step}: sequence failed: {error}")]
    UnexpectedError { step: usize, error: SequenceError },

    #[error("step {step}: expected a terminal signal, got extra element {actual}")]
    UnexpectedElement { step: usize, actual: String },

    #[error("expected the sequence to fail, but it completed")]
    ExpectedErrorButCompleted,

    #[error("error {error} does not match the expected failure")]
    ErrorMismatch { error: SequenceError },

    #[error("step {step}: no signal within {after:?}")]
    Timeout { step: usize, after: Duration },
}
