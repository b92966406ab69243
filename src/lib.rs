//! attrbind - typed option schemas synchronized with element attributes
//!
//! A schema maps option names to type constraints. Attached to host
//! elements, it keeps each element's `data-*` attributes and a typed value
//! cache in sync, and publishes `change` and `error` events.

pub mod binding;
pub mod cli;
pub mod codec;
pub mod collection;
pub mod config;
pub mod events;
pub mod host;
pub mod observability;
pub mod runtime;
pub mod schema;
pub mod types;

mod html_api;

pub use binding::{Binding, BindingError};
pub use collection::{AttachError, Collection, Target};
pub use config::ApiConfig;
pub use events::{ApiEvent, ChangeEvent, ErrorEvent, ErrorKind};
pub use html_api::HtmlApi;
pub use schema::{OptionDefinition, SchemaDefinition, SchemaError};
pub use types::{TypeConstraint, Value};
