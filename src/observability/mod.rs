//! Observability for attribute bindings
//!
//! Structured JSON log lines for lifecycle events, dispatched through
//! `tracing`. Logging is read-only: it never affects binding behavior.
//!
//! # Usage
//!
//! ```ignore
//! use attrbind::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::ValueRejected, &[("option", "count")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
