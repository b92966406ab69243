//! attrbind CLI entry point
//!
//! Parsing, logging setup and dispatch live in the CLI module; this only
//! maps failure to a non-zero exit status.

use attrbind::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
