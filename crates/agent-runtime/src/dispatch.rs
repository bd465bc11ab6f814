//! Two-tier tool dispatch
//!
//! A tool call is offered to an ordered list of resolvers. Each either
//! answers or passes; the first answer wins. The session normally runs with
//! the skill tier first and the static tool table last, and the table always
//! answers, so every call gets a JSON result back.

use crate::legacy::legacy_registry;
use agent_market::{ChartRenderer, FetchSummary, MarketDataProvider, SharedDataStore};
use agent_skills::SkillOrchestrator;
use agent_tools::{ToolRegistry, error_result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// One dispatch tier
#[async_trait]
pub trait ToolResolver: Send + Sync {
    /// Short label for logs
    fn tier(&self) -> &str;

    /// Answer the call, or `None` to let the next tier try
    async fn resolve(&self, name: &str, input: &Value) -> Option<Value>;
}

/// Tools the skill tier may serve, as (advertised name, skill tool name)
const SKILL_ROUTED_TOOLS: &[(&str, &str)] = &[
    ("fetch_stock_data", "fetch_stock_data"),
    ("fetch_etf_data", "fetch_etf_data"),
];

/// Skill tier: data-fetch tools served by loaded skills
pub struct SkillResolver {
    orchestrator: Arc<SkillOrchestrator>,
    store: SharedDataStore,
}

impl SkillResolver {
    /// `store` must be the store the orchestrator's skills write into
    pub fn new(orchestrator: Arc<SkillOrchestrator>, store: SharedDataStore) -> Self {
        Self { orchestrator, store }
    }

    fn skill_tool_for(name: &str) -> Option<&'static str> {
        SKILL_ROUTED_TOOLS
            .iter()
            .find(|(advertised, _)| *advertised == name)
            .map(|(_, internal)| *internal)
    }
}

#[async_trait]
impl ToolResolver for SkillResolver {
    fn tier(&self) -> &str {
        "skill"
    }

    async fn resolve(&self, name: &str, input: &Value) -> Option<Value> {
        let skill_tool = Self::skill_tool_for(name)?;
        if self.orchestrator.find_skill_for_tool(skill_tool).is_none() {
            return None;
        }

        let result = match self.orchestrator.execute_tool(skill_tool, input.clone()).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = name, error = %e, "Skill call failed, falling back");
                return None;
            }
        };

        if result.get("success").and_then(Value::as_bool) != Some(true) {
            let reason = result.get("error").and_then(Value::as_str).unwrap_or("unknown");
            warn!(tool = name, error = reason, "Skill rejected call, falling back");
            return None;
        }

        let normalized = normalize_fetch_result(&result, &self.store).await;
        if normalized.is_none() {
            warn!(tool = name, "Skill result could not be normalized, falling back");
        }
        normalized
    }
}

/// Rewrap a successful skill fetch into the summary the static table reports
///
/// The summary is rebuilt from the stored dataset so both tiers describe a
/// fetch the same way. `None` when the result names no stored dataset.
pub async fn normalize_fetch_result(result: &Value, store: &SharedDataStore) -> Option<Value> {
    let data_id = result.get("data_id").and_then(Value::as_str)?;
    let store = store.lock().await;
    let dataset = store.get(data_id)?;
    let summary = FetchSummary::from_series(
        data_id,
        &dataset.metadata.symbol,
        &dataset.metadata.name,
        &dataset.series,
    )?;
    serde_json::to_value(summary).ok()
}

/// Static tool table tier; answers every call
pub struct LegacyResolver {
    registry: ToolRegistry,
}

impl LegacyResolver {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

#[async_trait]
impl ToolResolver for LegacyResolver {
    fn tier(&self) -> &str {
        "legacy"
    }

    async fn resolve(&self, name: &str, input: &Value) -> Option<Value> {
        Some(self.registry.execute(name, input.clone()).await)
    }
}

/// Ordered resolvers of one session
pub struct ToolDispatcher {
    resolvers: Vec<Box<dyn ToolResolver>>,
}

impl ToolDispatcher {
    /// `[skill tier (when an orchestrator is given), static table]`
    ///
    /// The orchestrator's skills must share `store`.
    pub fn new(
        store: SharedDataStore,
        provider: Arc<dyn MarketDataProvider>,
        renderer: Arc<dyn ChartRenderer>,
        orchestrator: Option<Arc<SkillOrchestrator>>,
    ) -> Self {
        let mut resolvers: Vec<Box<dyn ToolResolver>> = Vec::new();
        if let Some(orchestrator) = orchestrator {
            resolvers.push(Box::new(SkillResolver::new(orchestrator, Arc::clone(&store))));
        }
        resolvers.push(Box::new(LegacyResolver::new(legacy_registry(
            &store, &provider, &renderer,
        ))));
        Self { resolvers }
    }

    /// Dispatcher over an explicit resolver list
    pub fn with_resolvers(resolvers: Vec<Box<dyn ToolResolver>>) -> Self {
        Self { resolvers }
    }

    /// Tier labels in order
    pub fn tiers(&self) -> Vec<&str> {
        self.resolvers.iter().map(|r| r.tier()).collect()
    }

    /// Run a tool call through the tiers
    pub async fn execute(&self, name: &str, input: &Value) -> Value {
        for resolver in &self.resolvers {
            if let Some(result) = resolver.resolve(name, input).await {
                debug!(tool = name, tier = resolver.tier(), "Tool call resolved");
                return result;
            }
        }
        error_result(format!("Unknown tool: {name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_market::testing::StubProvider;
    use agent_market::{DataStore, SvgChartRenderer};
    use agent_skills::{FinancialDataSkill, SkillCatalog, SkillServices};
    use serde_json::json;
    use std::fs;
    use std::path::Path;

    fn skills_root(dir: &Path) -> std::path::PathBuf {
        let root = dir.join("skills");
        let skill_dir = root.join(FinancialDataSkill::NAME);
        fs::create_dir_all(&skill_dir).unwrap();
        fs::write(
            skill_dir.join("SKILL.md"),
            "---\nname: financial-data-fetch\ndescription: 获取行情数据\n---\n使用说明\n",
        )
        .unwrap();
        root
    }

    fn dispatcher(dir: &Path, provider: StubProvider, with_skills: bool) -> (ToolDispatcher, SharedDataStore) {
        let store = DataStore::shared();
        let provider: Arc<dyn MarketDataProvider> = Arc::new(provider);
        let renderer: Arc<dyn ChartRenderer> = Arc::new(SvgChartRenderer::new(dir.join("charts")));
        let orchestrator = with_skills.then(|| {
            let services = SkillServices {
                provider: Arc::clone(&provider),
                store: Arc::clone(&store),
                chart_dir: dir.join("charts"),
            };
            Arc::new(SkillOrchestrator::load(
                skills_root(dir),
                &SkillCatalog::builtin(),
                &services,
            ))
        });
        (
            ToolDispatcher::new(Arc::clone(&store), provider, renderer, orchestrator),
            store,
        )
    }

    struct Passing;

    #[async_trait]
    impl ToolResolver for Passing {
        fn tier(&self) -> &str {
            "passing"
        }

        async fn resolve(&self, _name: &str, _input: &Value) -> Option<Value> {
            None
        }
    }

    #[tokio::test]
    async fn test_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let (with, _) = dispatcher(dir.path(), StubProvider::with_len(5), true);
        assert_eq!(with.tiers(), vec!["skill", "legacy"]);
        let (without, _) = dispatcher(dir.path(), StubProvider::with_len(5), false);
        assert_eq!(without.tiers(), vec!["legacy"]);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_structured_error() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, _) = dispatcher(dir.path(), StubProvider::with_len(5), true);
        let result = dispatcher.execute("delete_everything", &json!({})).await;
        assert_eq!(
            result,
            json!({"status": "error", "message": "Unknown tool: delete_everything"})
        );

        let empty = ToolDispatcher::with_resolvers(vec![Box::new(Passing)]);
        let result = empty.execute("fetch_stock_data", &json!({})).await;
        assert_eq!(result["message"], "Unknown tool: fetch_stock_data");
    }

    #[tokio::test]
    async fn test_skill_fetch_is_normalized_to_legacy_shape() {
        let dir = tempfile::tempdir().unwrap();
        let (skill_tier, _) = dispatcher(dir.path(), StubProvider::with_len(20).named("沪深300ETF"), true);
        let (legacy_tier, _) = dispatcher(dir.path(), StubProvider::with_len(20).named("沪深300ETF"), false);

        let input = json!({"symbol": "510300", "days": 30});
        let from_skill = skill_tier.execute("fetch_etf_data", &input).await;
        let from_legacy = legacy_tier.execute("fetch_etf_data", &input).await;

        assert_eq!(from_skill, from_legacy);
        assert_eq!(from_skill["status"], "success");
        assert!(from_skill.get("success").is_none());
        assert!(from_skill.get("data").is_none());
    }

    #[tokio::test]
    async fn test_rejected_skill_call_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, store) = dispatcher(dir.path(), StubProvider::with_len(10), true);

        // The skill insists on 6 digits, the static table does not
        let result = dispatcher
            .execute("fetch_stock_data", &json!({"symbol": "AAPL"}))
            .await;

        assert_eq!(result["status"], "success");
        assert_eq!(result["symbol"], "AAPL");
        assert_eq!(store.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_absurd_days_is_an_error_in_both_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let input = json!({"symbol": "600519", "days": i64::MAX});
        for with_skills in [true, false] {
            let (dispatcher, store) = dispatcher(dir.path(), StubProvider::with_len(10), with_skills);
            let result = dispatcher.execute("fetch_stock_data", &input).await;

            assert_eq!(result["status"], "error");
            assert!(result["message"].as_str().unwrap().contains("Invalid date"));
            assert!(store.lock().await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_analysis_is_never_skill_routed() {
        assert!(SkillResolver::skill_tool_for("analyze_and_plot").is_none());
        assert_eq!(
            SkillResolver::skill_tool_for("fetch_stock_data"),
            Some("fetch_stock_data")
        );
    }

    #[tokio::test]
    async fn test_normalize_requires_stored_dataset() {
        let store = DataStore::shared();
        assert!(normalize_fetch_result(&json!({"success": true}), &store).await.is_none());
        assert!(
            normalize_fetch_result(&json!({"success": true, "data_id": "data_3"}), &store)
                .await
                .is_none()
        );
    }
}
