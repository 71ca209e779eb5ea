//! Friendly type tags for declared parameter types.
//!
//! Generated URLs annotate every placeholder and query key with a coarse
//! classification of the Java type bound to it (`{id:int}`, `q:string`).

use serde::{Deserialize, Serialize};

/// Declared type names that map to [`FriendlyType::Int`] on an exact match.
const INTEGER_TYPES: &[&str] = &["int", "integer", "long", "short", "byte"];

/// Substrings that map to [`FriendlyType::Number`].
const DECIMAL_TYPES: &[&str] = &["double", "float", "bigdecimal"];

/// Simplified type classification used in generated URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendlyType {
    Int,
    Uuid,
    Bool,
    Number,
    String,
}

impl FriendlyType {
    /// Classify a declared type name. Total: unknown or absent types are
    /// [`FriendlyType::String`].
    pub fn from_declared(declared: Option<&str>) -> Self {
        let Some(declared) = declared else {
            return FriendlyType::String;
        };
        let lower = declared.trim().to_lowercase();

        if INTEGER_TYPES.contains(&lower.as_str()) {
            FriendlyType::Int
        } else if lower.contains("uuid") {
            FriendlyType::Uuid
        } else if lower.contains("boolean") {
            FriendlyType::Bool
        } else if DECIMAL_TYPES.iter().any(|t| lower.contains(t)) {
            FriendlyType::Number
        } else {
            FriendlyType::String
        }
    }

    /// The tag as written into a URL.
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendlyType::Int => "int",
            FriendlyType::Uuid => "uuid",
            FriendlyType::Bool => "bool",
            FriendlyType::Number => "number",
            FriendlyType::String => "string",
        }
    }
}

impl std::fmt::Display for FriendlyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
