#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]

//! # docsheet
//!
//! Flattens nested, schema-less document-store records into rectangular
//! tables and writes them as spreadsheet sheets.
//!
//! ## Features
//!
//! - **Path flattening**: nested mappings become dot-joined columns
//! - **Array expansion**: array columns explode into rows, element mappings
//!   into prefixed sub-columns
//! - **Declarative exports**: YAML definitions list the query groups to run
//!   against MongoDB, with batch and soft-delete toggles
//! - **Augmentation**: identifiers from one table drive an HTTP fetch that
//!   adds one more sheet
//! - **Sinks**: xlsx workbooks or JSON lines
//!
//! ## Quick Start
//!
//! ```rust
//! use docsheet::{Tabularizer, tabular::TabularConfig};
//! use serde_json::json;
//!
//! let records = vec![
//!     json!({"id": 1, "owner": {"name": "Ann"}, "tags": ["a", "b"]}),
//!     json!({"id": 2, "owner": {"name": "Bob"}}),
//! ];
//! let table = Tabularizer::new(TabularConfig::default())
//!     .tabularize(&records)
//!     .unwrap();
//!
//! assert_eq!(table.columns(), ["id", "owner.name", "tags"]);
//! assert_eq!(table.num_rows(), 3);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        ExportEngine                             │
//! │  per group: resolve filter → find → tabularize → NamedTable     │
//! │  then: correlation keys → augmentation fetch → NamedTable       │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │  Source  │  Tabular  │    Augment    │   Auth    │   Output    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ MongoDB  │ Coerce    │ Keys          │ Session   │ xlsx        │
//! │ Memory   │ Flatten   │ HTTP fetch    │ Bearer    │ JSON lines  │
//! │          │ Expand    │ Decode        │ API Key   │ Sheet names │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

pub mod augment;
pub mod auth;
pub mod cli;
pub mod config;
pub mod decode;
pub mod definitions;
pub mod engine;
pub mod error;
pub mod http;
pub mod loader;
pub mod output;
pub mod source;
pub mod tabular;
pub mod template;
pub mod types;

pub use error::{Error, Result};
pub use loader::{load_definition, load_definition_from_str, ExportDefinition};
pub use tabular::{Table, Tabularizer};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
