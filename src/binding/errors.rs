//! Binding error types

use thiserror::Error;

/// Misuse of a binding's options surface.
///
/// Rejected values are not errors here; they are published as `error`
/// events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("Unknown option \"{0}\"")]
    UnknownOption(String),

    #[error("Binding has been destroyed")]
    Destroyed,
}

/// Result type for binding operations
pub type BindingResult<T> = Result<T, BindingError>;
