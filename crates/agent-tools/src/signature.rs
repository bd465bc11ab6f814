//! Tool signatures
//!
//! A signature is what a tool declares about itself: name, description and
//! parameter schema. Skills and legacy tools advertise the same shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared signature of a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSignature {
    /// Tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON schema for the tool's input parameters
    pub parameters: Value,
}

impl ToolSignature {
    /// Create a new signature
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Helpers to build JSON schemas for tools
pub mod schema {
    use serde_json::{Value, json};

    /// Object schema with properties
    pub fn object(properties: Value, required: &[&str]) -> Value {
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// String property schema
    pub fn string(description: &str) -> Value {
        json!({ "type": "string", "description": description })
    }

    /// String property restricted to `values`
    pub fn string_enum(description: &str, values: &[&str], default: &str) -> Value {
        json!({
            "type": "string",
            "description": description,
            "enum": values,
            "default": default,
        })
    }

    /// Integer property schema
    pub fn integer(description: &str) -> Value {
        json!({ "type": "integer", "description": description })
    }

    /// Integer property schema with a default
    pub fn integer_with_default(description: &str, default: i64) -> Value {
        json!({ "type": "integer", "description": description, "default": default })
    }

    /// Number property schema with a default
    pub fn number_with_default(description: &str, default: f64) -> Value {
        json!({ "type": "number", "description": description, "default": default })
    }

    /// Integer array property schema with a default
    pub fn integer_array(description: &str, default: &[i64]) -> Value {
        json!({
            "type": "array",
            "items": { "type": "integer" },
            "description": description,
            "default": default,
        })
    }
}
