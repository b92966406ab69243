//! Attach and lookup errors

use thiserror::Error;

use crate::host::ElementId;

/// Structural failure while attaching a schema or looking up a binding
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttachError {
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("No element found for selector \"{0}\"")]
    NoElementMatched(String),

    #[error("Selector \"{selector}\" matched {count} elements")]
    AmbiguousElement { selector: String, count: usize },

    #[error("The given element ({0}) does not have this API attached")]
    NotAttached(ElementId),

    #[error("Error setting initial option \"{option}\" on {element}: {message}")]
    InitialValue {
        element: ElementId,
        option: String,
        message: String,
    },

    #[error("Collection has been destroyed")]
    Destroyed,
}

impl AttachError {
    /// Option the error is attributed to, if any
    pub fn option(&self) -> Option<&str> {
        match self {
            AttachError::InitialValue { option, .. } => Some(option),
            _ => None,
        }
    }
}

/// Result type for attach operations
pub type AttachResult<T> = Result<T, AttachError>;
