//! Option schemas
//!
//! A schema maps option names to type constraints plus optional `required`
//! or `default` settings. Schemas are validated once, at definition time,
//! and only change through an explicit, re-validated merge.
//!
//! # Design Principles
//!
//! - Structural problems fail fast with a `SchemaError`
//! - Errors are attributed to the offending option
//! - Implicit nullability: options that are neither required nor defaulted
//!   accept null unless the strict policy is configured

mod errors;
mod loader;
mod types;
mod validator;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult};
pub use loader::SchemaLoader;
pub use types::{OptionDefinition, OptionSpec, Schema, SchemaDefinition};
pub use validator::SchemaValidator;
