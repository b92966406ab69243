//! # Constraint Errors
//!
//! Failures raised by a constraint's `unserialize`. The resolver treats any
//! of these as "not a match"; they never reach the event channel directly.

use thiserror::Error;

/// Result type for unserialization
pub type ConstraintResult<T> = Result<T, ConstraintError>;

/// Unserialization errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstraintError {
    /// No attribute text to unserialize
    #[error("Cannot unserialize an absent value")]
    Absent,

    /// Text is not valid JSON
    #[error("Invalid JSON \"{text}\": {reason}")]
    InvalidJson { text: String, reason: String },

    /// Text is not a boolean attribute form
    #[error("Invalidly serialized boolean \"{0}\"")]
    InvalidBoolean(String),

    /// Function source could not be evaluated
    #[error("Cannot evaluate function source: {0}")]
    Evaluation(String),

    /// Rejected by a custom constraint
    #[error("{0}")]
    Custom(String),
}
