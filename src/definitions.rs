//! Built-in export definitions embedded in the binary
//!
//! Lets users run `export -d relationship-migration` instead of pointing at
//! a YAML file.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Built-in export YAML definitions
pub static BUILTIN_DEFINITIONS: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        let mut m = HashMap::new();

        m.insert(
            "relationship-migration",
            include_str!("../definitions/relationship-migration.yaml"),
        );
        m.insert(
            "relationship-migration-responses",
            include_str!("../definitions/relationship-migration-responses.yaml"),
        );
        m.insert(
            "relationship-migration-with-formresponse",
            include_str!("../definitions/relationship-migration-responses.yaml"),
        );

        m
    });

/// Definition metadata for display
#[derive(Debug, Clone)]
pub struct DefinitionInfo {
    /// Primary name
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Other names it loads under
    pub aliases: &'static [&'static str],
    /// Keys the user config must provide
    pub config_keys: &'static [&'static str],
}

/// Get a built-in definition by name
pub fn get_builtin(name: &str) -> Option<&'static str> {
    BUILTIN_DEFINITIONS.get(name).copied()
}

/// Check if a name is a built-in definition
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_DEFINITIONS.contains_key(name)
}

/// List built-in definition names (primary names only)
pub fn list_builtin() -> Vec<&'static str> {
    list_builtin_info().iter().map(|info| info.name).collect()
}

/// Describe every built-in definition
pub fn list_builtin_info() -> Vec<DefinitionInfo> {
    vec![
        DefinitionInfo {
            name: "relationship-migration",
            description: "Risk assessments, forms, recurrence and relationships per bulk process",
            aliases: &[],
            config_keys: &["connection_string", "database"],
        },
        DefinitionInfo {
            name: "relationship-migration-responses",
            description: "Relationship migration plus form responses from the storage service",
            aliases: &["relationship-migration-with-formresponse"],
            config_keys: &[
                "connection_string",
                "database",
                "token_url",
                "storage_url",
                "client_id",
                "app_id",
                "transaction_id",
            ],
        },
    ]
}
