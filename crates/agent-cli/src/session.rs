//! Wiring of one analysis session
//!
//! The market data provider (and its cache) lives for the whole process.
//! Every session gets a fresh dataset store, so `data_N` ids restart at 1.

use agent_llm::ChatModel;
use agent_market::{
    CachingProvider, ChartRenderer, DataStore, MarketDataProvider, SharedDataStore,
    SvgChartRenderer, YahooProvider,
};
use agent_runtime::{ExecutorEventHandler, FinancialAgent, ToolDispatcher};
use agent_skills::{SkillCatalog, SkillOrchestrator, SkillServices};
use agent_utils::AppConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Long-lived pieces shared by every session
pub struct SessionFactory {
    config: AppConfig,
    model: Arc<dyn ChatModel>,
    provider: Arc<dyn MarketDataProvider>,
    renderer: Arc<dyn ChartRenderer>,
    events: Arc<dyn ExecutorEventHandler>,
}

/// One agent plus the store its tools write to
pub struct Session {
    pub agent: FinancialAgent,
    pub store: SharedDataStore,
    pub skills: Option<Arc<SkillOrchestrator>>,
}

impl SessionFactory {
    /// Factory backed by Yahoo Finance behind a TTL cache
    pub fn new(
        config: AppConfig,
        model: Arc<dyn ChatModel>,
        events: Arc<dyn ExecutorEventHandler>,
    ) -> Self {
        let provider = CachingProvider::new(
            YahooProvider::new(config.requests_per_minute),
            Duration::from_secs(config.cache_ttl_secs),
        );
        Self::with_provider(config, model, Arc::new(provider), events)
    }

    pub fn with_provider(
        config: AppConfig,
        model: Arc<dyn ChatModel>,
        provider: Arc<dyn MarketDataProvider>,
        events: Arc<dyn ExecutorEventHandler>,
    ) -> Self {
        let renderer: Arc<dyn ChartRenderer> = Arc::new(SvgChartRenderer::new(&config.output_dir));
        Self {
            config,
            model,
            provider,
            renderer,
            events,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Skills discovered under the configured root, sharing `store`
    pub fn load_skills(&self, store: &SharedDataStore) -> SkillOrchestrator {
        let services = SkillServices {
            provider: Arc::clone(&self.provider),
            store: Arc::clone(store),
            chart_dir: self.config.output_dir.clone(),
        };
        SkillOrchestrator::load(
            self.config.skills_dir.clone(),
            &SkillCatalog::builtin(),
            &services,
        )
    }

    /// Fresh store, skill tier and agent
    pub fn open(&self) -> anyhow::Result<Session> {
        let store = DataStore::shared();
        let skills = self
            .config
            .use_skills
            .then(|| Arc::new(self.load_skills(&store)));
        if let Some(skills) = &skills {
            info!(skills = ?skills.skill_names(), "Skill tier enabled");
        }

        let dispatcher = Arc::new(ToolDispatcher::new(
            Arc::clone(&store),
            Arc::clone(&self.provider),
            Arc::clone(&self.renderer),
            skills.clone(),
        ));

        let agent = FinancialAgent::builder()
            .name("fin-agent")
            .chat_model(Arc::clone(&self.model))
            .dispatcher(dispatcher)
            .model(self.config.model.clone())
            .max_iterations(self.config.max_iterations)
            .event_handler(Arc::clone(&self.events))
            .build()?;

        Ok(Session {
            agent,
            store,
            skills,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_market::{Adjustment, DateRange, InstrumentKind, MarketError, OhlcvSeries};
    use agent_runtime::NoOpEventHandler;
    use async_trait::async_trait;

    struct NoMarket;

    #[async_trait]
    impl MarketDataProvider for NoMarket {
        async fn fetch_instrument_series(
            &self,
            _kind: InstrumentKind,
            symbol: &str,
            range: DateRange,
            _adjustment: Adjustment,
        ) -> agent_market::Result<OhlcvSeries> {
            Err(MarketError::NotFound {
                symbol: symbol.to_string(),
                start: range.start_compact(),
                end: range.end_compact(),
            })
        }

        async fn fetch_display_name(&self, _symbol: &str) -> Option<String> {
            None
        }
    }

    struct SilentModel;

    #[async_trait]
    impl ChatModel for SilentModel {
        async fn get_response(&self, _model: &str, _prompt: &str, _temperature: f32) -> agent_llm::Result<String> {
            Ok("好的".to_string())
        }
    }

    fn factory(config: AppConfig) -> SessionFactory {
        SessionFactory::with_provider(
            config,
            Arc::new(SilentModel),
            Arc::new(NoMarket),
            Arc::new(NoOpEventHandler),
        )
    }

    #[tokio::test]
    async fn test_sessions_have_separate_stores() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::builder()
            .skills_dir(dir.path().join("missing"))
            .output_dir(dir.path())
            .max_iterations(3)
            .build()
            .unwrap();
        let factory = factory(config);

        let first = factory.open().unwrap();
        let second = factory.open().unwrap();
        assert!(!Arc::ptr_eq(&first.store, &second.store));
        assert_eq!(first.agent.config().max_iterations, 3);
        assert!(first.skills.as_ref().is_some_and(|s| s.is_empty()));
    }

    #[tokio::test]
    async fn test_skill_tier_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::builder()
            .output_dir(dir.path())
            .use_skills(false)
            .build()
            .unwrap();
        let session = factory(config).open().unwrap();

        assert!(session.skills.is_none());
        assert_eq!(session.agent.dispatcher().tiers(), ["legacy"]);
    }
}
