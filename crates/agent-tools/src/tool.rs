//! Tool trait definition

use crate::ToolSignature;
use agent_core::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Trait for tools that agents can execute
///
/// Each tool provides a name, a description for the model, and a JSON schema
/// for its input. `execute` receives the model's `action_input` object.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with given parameters
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Get the tool's name
    ///
    /// Must be unique within a ToolRegistry
    fn name(&self) -> &str;

    /// Get the tool's description
    fn description(&self) -> &str;

    /// Get the tool's input schema (JSON Schema format)
    fn input_schema(&self) -> Value;

    /// Signature advertised for this tool
    fn signature(&self) -> ToolSignature {
        ToolSignature::new(self.name(), self.description(), self.input_schema())
    }
}
