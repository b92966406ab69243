//! CLI module for attrbind
//!
//! Provides command-line interface for:
//! - check: Validate schema files
//! - decode: Attach a schema to an element and read its options
//! - encode: Set options and read back the element's attributes

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, decode, encode, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
