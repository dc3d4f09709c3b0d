//! Function Registry - Load function definitions from JSON
//!
//! This module loads the scheduled function definitions from an embedded
//! JSON file and provides lookup functions for the extension assembler.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Embedded function definitions (compiled into the binary)
const FUNCTIONS_FILE: &str = include_str!("../resources/functions.json");

/// Key of the collection function deployed by the scope-aware template
pub const COLLECTION_KEY: &str = "collection";

/// Function definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionDef {
    pub description: String,
    /// Symbol invoked inside the packaged source archive
    pub entry_point: String,
    /// Roles the function's executor needs on the owning scope
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Root structure of resources/functions.json
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionRegistry {
    /// Roles every extension executor gets regardless of which run
    #[serde(default)]
    pub extension_base_roles: Vec<String>,
    pub collection: FunctionDef,
    #[serde(default)]
    pub extensions: BTreeMap<String, FunctionDef>,
}

/// A registry entry paired with its key
#[derive(Debug, Clone, Copy)]
pub struct FunctionRef {
    pub key: &'static str,
    pub def: &'static FunctionDef,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

/// Get the function registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static FunctionRegistry {
    REGISTRY.get_or_init(|| {
        serde_json::from_str(FUNCTIONS_FILE)
            .unwrap_or_else(|e| panic!("Failed to parse embedded function JSON: {}", e))
    })
}

/// Get an extension definition by key
pub fn get_extension(key: &str) -> Option<FunctionRef> {
    get_registry()
        .extensions
        .get_key_value(key)
        .map(|(key, def)| FunctionRef {
            key: key.as_str(),
            def,
        })
}

/// Get all extension keys, in key order
pub fn get_all_extension_keys() -> Vec<&'static str> {
    get_registry()
        .extensions
        .keys()
        .map(|s| s.as_str())
        .collect()
}

/// The collection function used by the scope-aware template
pub fn collection_function() -> FunctionRef {
    FunctionRef {
        key: COLLECTION_KEY,
        def: &get_registry().collection,
    }
}

/// Resolve the enabled extensions: registry keys intersected with the
/// requested ones, in registry key order. Unknown keys are skipped.
pub fn select_extensions<S: AsRef<str>>(requested: &[S]) -> Vec<FunctionRef> {
    for key in requested {
        if get_extension(key.as_ref()).is_none() {
            tracing::warn!("Ignoring unknown extension: {}", key.as_ref());
        }
    }

    get_registry()
        .extensions
        .iter()
        .filter(|(key, _)| requested.iter().any(|r| r.as_ref() == key.as_str()))
        .map(|(key, def)| FunctionRef {
            key: key.as_str(),
            def,
        })
        .collect()
}
