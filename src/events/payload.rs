//! Event payloads published by bindings and collections

use std::fmt;

use crate::host::ElementId;
use crate::types::Value;

/// Type of every option change
pub const CHANGE: &str = "change";
/// Type of runtime errors
pub const ERROR: &str = "error";
/// Type announcing a newly bound element
pub const NEW_ELEMENT: &str = "newElement";

/// Per-option change channel, `change:<option>`
pub fn change_type(option: &str) -> String {
    format!("{}:{}", CHANGE, option)
}

/// An option changed its value
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub element: ElementId,
    pub option: String,
    pub value: Value,
    pub old_value: Value,
    /// Synthetic notification of the starting value
    pub initial: bool,
}

/// Kind of runtime error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required option's attribute is absent
    MissingRequired,
    /// Attribute text rejected by the option's constraints
    InvalidValueHtml,
    /// Programmatic value rejected by the option's constraints
    InvalidValueJs,
    /// An element inserted under the host could not be bound
    AttachFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingRequired => "missing-required",
            ErrorKind::InvalidValueHtml => "invalid-value-html",
            ErrorKind::InvalidValueJs => "invalid-value-js",
            ErrorKind::AttachFailed => "attach-failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A rejected value or missing option
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEvent {
    pub element: ElementId,
    pub kind: ErrorKind,
    pub option: Option<String>,
    /// Offending value; attribute text is carried as a string
    pub value: Option<Value>,
    pub message: String,
}

/// Payload of every binding and collection event
#[derive(Debug, Clone, PartialEq)]
pub enum ApiEvent {
    Change(ChangeEvent),
    Error(ErrorEvent),
    NewElement(ElementId),
}

impl ApiEvent {
    /// Element the event originates from
    pub fn element(&self) -> ElementId {
        match self {
            ApiEvent::Change(e) => e.element,
            ApiEvent::Error(e) => e.element,
            ApiEvent::NewElement(element) => *element,
        }
    }

    pub fn as_change(&self) -> Option<&ChangeEvent> {
        match self {
            ApiEvent::Change(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorEvent> {
        match self {
            ApiEvent::Error(e) => Some(e),
            _ => None,
        }
    }
}
