//! Tool registry for managing available tools

use crate::{Tool, ToolSignature};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, error};

/// Structured error payload returned to the model
pub fn error_result(message: impl Into<String>) -> Value {
    json!({ "status": "error", "message": message.into() })
}

/// Registry for managing tools
///
/// `execute` is the error boundary of the static tool table: whatever a tool
/// returns or fails with, the caller gets a JSON value back.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    /// Create a new tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&self, tool: Arc<dyn Tool>) {
        let mut tools = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        tools.get(name).cloned()
    }

    /// True when a tool named `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered tool names, sorted
    pub fn names(&self) -> Vec<String> {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Signatures of all tools, sorted by name
    pub fn signatures(&self) -> Vec<ToolSignature> {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        let mut signatures: Vec<ToolSignature> = tools.values().map(|t| t.signature()).collect();
        signatures.sort_by(|a, b| a.name.cmp(&b.name));
        signatures
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run a tool by name
    ///
    /// Unknown names and tool failures both come back as
    /// `{"status": "error", "message": ...}`.
    pub async fn execute(&self, name: &str, params: Value) -> Value {
        let Some(tool) = self.get(name) else {
            return error_result(format!("Unknown tool: {name}"));
        };

        debug!(tool = name, "Executing tool");
        match tool.execute(params).await {
            Ok(value) => value,
            Err(err) => {
                error!(tool = name, error = %err, "Tool execution failed");
                error_result(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{Error, Result};
    use async_trait::async_trait;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        async fn execute(&self, params: Value) -> Result<Value> {
            Ok(json!({ "status": "success", "echo": params }))
        }

        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the input"
        }

        fn input_schema(&self) -> Value {
            json!({ "type": "object" })
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        async fn execute(&self, _params: Value) -> Result<Value> {
            Err(Error::tool("broken", "upstream unavailable"))
        }

        fn name(&self) -> &str {
            "broken"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        fn input_schema(&self) -> Value {
            json!({ "type": "object" })
        }
    }

    fn registry() -> ToolRegistry {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(FailingTool));
        registry
    }

    #[test]
    fn test_register_and_list() {
        let registry = registry();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("echo"));
        assert_eq!(registry.names(), vec!["broken".to_string(), "echo".to_string()]);
        assert_eq!(registry.signatures()[1].name, "echo");
    }

    #[tokio::test]
    async fn test_execute_success() {
        let result = registry().execute("echo", json!({ "x": 1 })).await;
        assert_eq!(result["status"], "success");
        assert_eq!(result["echo"]["x"], 1);
    }

    #[tokio::test]
    async fn test_execute_failure_becomes_error_payload() {
        let result = registry().execute("broken", json!({})).await;
        assert_eq!(result["status"], "error");
        assert_eq!(
            result["message"],
            "Tool 'broken' failed: upstream unavailable"
        );
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let result = registry().execute("fly_to_moon", json!({})).await;
        assert_eq!(result, json!({ "status": "error", "message": "Unknown tool: fly_to_moon" }));
    }

    #[test]
    fn test_empty_registry() {
        assert!(ToolRegistry::new().is_empty());
    }
}
