//! CLI module
//!
//! Command-line interface for running exports.
//!
//! # Commands
//!
//! - `export` - Run an export definition against the document store
//! - `flatten` - Tabularize a local JSON or JSONL file
//! - `validate` - Check an export definition
//! - `list` - List built-in definitions

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::{write_tables, Runner};
