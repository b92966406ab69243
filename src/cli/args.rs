//! CLI argument definitions using clap
//!
//! Commands:
//! - attrbind check <schema> [--config <path>]
//! - attrbind decode <schema> --attr <name=value>...
//! - attrbind encode <schema> --set <option=json>...

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// attrbind - typed options bound to element attributes
#[derive(Parser, Debug)]
#[command(name = "attrbind")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a schema file, or every schema in a directory
    Check {
        /// Schema file or directory of *.json schemas
        schema: PathBuf,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Attach a schema to an element and report the decoded options
    Decode {
        /// Schema file
        schema: PathBuf,

        /// Attribute present on the element
        #[arg(long = "attr", value_name = "NAME=VALUE")]
        attributes: Vec<String>,

        /// Tag of the element
        #[arg(long, default_value = "div")]
        tag: String,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Set option values and report the resulting attributes
    Encode {
        /// Schema file
        schema: PathBuf,

        /// Option value as JSON
        #[arg(long = "set", value_name = "OPTION=JSON")]
        values: Vec<String>,

        /// Attribute present on the element before the values are set
        #[arg(long = "attr", value_name = "NAME=VALUE")]
        attributes: Vec<String>,

        /// Tag of the element
        #[arg(long, default_value = "div")]
        tag: String,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
