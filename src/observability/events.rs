//! Lifecycle events for attribute bindings
//!
//! Events are explicit and typed. Each maps to a stable uppercase name
//! used as the `event` key of the structured log line.

use std::fmt;

use super::logger::Severity;

/// Observable lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Schema
    /// Schema validated and frozen
    SchemaDefined,
    /// Schema amended by a merge
    SchemaMerged,
    /// Schema files loaded from disk
    SchemasLoaded,
    /// Configuration loaded
    ConfigLoaded,

    // Collection
    /// Collection attached to its initial elements
    CollectionAttached,
    /// Collection torn down
    CollectionDestroyed,
    /// Element joined a collection after attach
    ElementAdded,
    /// Element left a collection
    ElementRemoved,
    /// Element inserted under the host could not be bound
    AttachFailed,

    // Binding
    /// Binding attached to an element
    BindingAttached,
    /// Binding torn down
    BindingDestroyed,
    /// Value rejected by its option's constraints
    ValueRejected,
    /// Required attribute absent after attach
    MissingRequired,
}

impl Event {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::SchemaDefined => "SCHEMA_DEFINED",
            Event::SchemaMerged => "SCHEMA_MERGED",
            Event::SchemasLoaded => "SCHEMAS_LOADED",
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::CollectionAttached => "COLLECTION_ATTACHED",
            Event::CollectionDestroyed => "COLLECTION_DESTROYED",
            Event::ElementAdded => "ELEMENT_ADDED",
            Event::ElementRemoved => "ELEMENT_REMOVED",
            Event::AttachFailed => "ATTACH_FAILED",

            Event::BindingAttached => "BINDING_ATTACHED",
            Event::BindingDestroyed => "BINDING_DESTROYED",
            Event::ValueRejected => "VALUE_REJECTED",
            Event::MissingRequired => "MISSING_REQUIRED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::ValueRejected | Event::MissingRequired | Event::AttachFailed => Severity::Warn,
            Event::BindingAttached | Event::BindingDestroyed => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
