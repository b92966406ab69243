//! Codec error types

use thiserror::Error;

/// Failure to convert a value between its typed and serialized forms
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// A required option lost its value
    #[error("Invalid option removal")]
    InvalidRemoval,

    /// Attribute text matched none of the option's constraints
    #[error("Invalid serialized option value \"{text}\"")]
    Decode { text: String },

    /// Typed value matched none of the option's constraints
    #[error("Invalid option value \"{value}\"")]
    Validate { value: String },
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
