//! YAML Loader module
//!
//! Parse export definitions from YAML files.
//!
//! # Overview
//!
//! The loader module provides:
//! - `ExportDefinition` - Declarative export definition
//! - `QueryDefinition` - One query group (collection, filter, projection)
//! - `AugmentationDefinition` - Correlated HTTP fetch
//! - YAML parsing with validation

mod parser;
mod types;

pub use parser::{load_definition, load_definition_from_str, validate_definition};
pub use types::{
    AugmentationDefinition, AugmentationRequestDefinition, AuthDefinition, CorrelationDefinition,
    ExpansionModeDefinition, ExportDefinition, HttpDefinition, OutputDefinition, QueryDefinition,
    RunDefinition, SourceDefinition, TabularDefinition,
};
