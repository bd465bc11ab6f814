//! Skill capability trait and the services handed to skills

use crate::descriptor::SkillDescriptor;
use crate::error::Result;
use agent_market::{MarketDataProvider, SharedDataStore};
use agent_tools::ToolSignature;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;

/// A loaded skill: a descriptor plus the tools it implements
///
/// `invoke` returns `Ok` for outcomes the model should see, including
/// rejected input (`{"success": false, "error": ...}`). `Err` is kept for
/// calls the skill cannot serve at all, such as a tool it does not declare.
#[async_trait]
pub trait Skill: Send + Sync {
    fn descriptor(&self) -> &SkillDescriptor;

    /// Tools this skill serves, in declaration order
    fn list_tool_signatures(&self) -> Vec<ToolSignature>;

    async fn invoke(&self, tool: &str, args: Value) -> Result<Value>;

    fn name(&self) -> &str {
        &self.descriptor().name
    }

    /// True when `tool` is among the declared signatures
    fn declares(&self, tool: &str) -> bool {
        self.list_tool_signatures().iter().any(|s| s.name == tool)
    }
}

/// Shared services every skill may use
#[derive(Clone)]
pub struct SkillServices {
    pub provider: Arc<dyn MarketDataProvider>,
    pub store: SharedDataStore,
    pub chart_dir: PathBuf,
}

/// Everything a skill factory receives
#[derive(Clone)]
pub struct SkillContext {
    pub descriptor: SkillDescriptor,
    pub services: SkillServices,
}

/// `{"success": false, "error": message}`
pub fn failure(message: impl Into<String>) -> Value {
    json!({ "success": false, "error": message.into() })
}
