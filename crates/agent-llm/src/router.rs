//! Model-name routing
//!
//! The model name alone decides which protocol, endpoint and credential are
//! used. Names containing `claude` or `anthropic` use the Anthropic messages
//! API; every other name goes to an OpenAI-compatible endpoint chosen by
//! vendor substring.

use crate::providers::anthropic::ANTHROPIC_API_BASE;
use crate::providers::openai::DEFAULT_OPENAI_API_BASE;
use crate::providers::{AnthropicProvider, OpenAIConfig, OpenAIProvider};
use crate::{ChatModel, CompletionRequest, LLMError, LLMProvider, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Max tokens requested from every provider
const MAX_TOKENS: usize = 2000;

/// Wire protocol of a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Anthropic,
    OpenAiCompatible,
}

/// Static routing entry for a family of models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderRoute {
    /// Short label used in logs and key status
    pub label: &'static str,
    pub protocol: Protocol,
    pub api_key_env: &'static str,
    pub base_url_env: &'static str,
    pub default_base_url: &'static str,
}

const ANTHROPIC: ProviderRoute = ProviderRoute {
    label: "anthropic",
    protocol: Protocol::Anthropic,
    api_key_env: "ANTHROPIC_API_KEY",
    base_url_env: "ANTHROPIC_BASE_URL",
    default_base_url: ANTHROPIC_API_BASE,
};

const QWEN: ProviderRoute = ProviderRoute {
    label: "qwen",
    protocol: Protocol::OpenAiCompatible,
    api_key_env: "QWEN_API_KEY",
    base_url_env: "QWEN_BASE_URL",
    default_base_url: "https://dashscope.aliyuncs.com/compatible-mode/v1",
};

const ZHIPU: ProviderRoute = ProviderRoute {
    label: "zhipu",
    protocol: Protocol::OpenAiCompatible,
    api_key_env: "ZHIPU_API_KEY",
    base_url_env: "ZHIPU_BASE_URL",
    default_base_url: "https://open.bigmodel.cn/api/paas/v4/",
};

const DEEPSEEK: ProviderRoute = ProviderRoute {
    label: "deepseek",
    protocol: Protocol::OpenAiCompatible,
    api_key_env: "DEEPSEEK_API_KEY",
    base_url_env: "DEEPSEEK_BASE_URL",
    default_base_url: "https://api.deepseek.com",
};

const MOONSHOT: ProviderRoute = ProviderRoute {
    label: "moonshot",
    protocol: Protocol::OpenAiCompatible,
    api_key_env: "MOONSHOT_API_KEY",
    base_url_env: "MOONSHOT_BASE_URL",
    default_base_url: "https://api.moonshot.cn/v1",
};

const OPENAI: ProviderRoute = ProviderRoute {
    label: "openai",
    protocol: Protocol::OpenAiCompatible,
    api_key_env: "OPENAI_API_KEY",
    base_url_env: "OPENAI_BASE_URL",
    default_base_url: DEFAULT_OPENAI_API_BASE,
};

/// Every route, in matching order
pub const ROUTES: [ProviderRoute; 6] = [ANTHROPIC, QWEN, ZHIPU, DEEPSEEK, MOONSHOT, OPENAI];

/// Pick the route for a model name
pub fn route_for(model: &str) -> ProviderRoute {
    let model = model.to_lowercase();
    if model.contains("claude") || model.contains("anthropic") {
        ANTHROPIC
    } else if model.contains("qwen") {
        QWEN
    } else if model.contains("glm") {
        ZHIPU
    } else if model.contains("deepseek") {
        DEEPSEEK
    } else if model.contains("kimi") || model.contains("moonshot") {
        MOONSHOT
    } else {
        OPENAI
    }
}

/// A route with its credential and base URL resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoint {
    pub route: ProviderRoute,
    pub api_key: String,
    pub base_url: String,
}

impl ProviderRoute {
    /// Resolve key and base URL through `lookup`
    pub fn resolve<F>(&self, lookup: F) -> Result<ProviderEndpoint>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(self.api_key_env)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                LLMError::ConfigurationError(format!(
                    "{} environment variable not set",
                    self.api_key_env
                ))
            })?;
        let base_url =
            lookup(self.base_url_env).unwrap_or_else(|| self.default_base_url.to_string());

        Ok(ProviderEndpoint {
            route: *self,
            api_key,
            base_url,
        })
    }
}

impl ProviderEndpoint {
    fn build_provider(&self) -> Result<Arc<dyn LLMProvider>> {
        Ok(match self.route.protocol {
            Protocol::Anthropic => Arc::new(AnthropicProvider::with_base(
                self.api_key.clone(),
                self.base_url.clone(),
            )?),
            Protocol::OpenAiCompatible => Arc::new(OpenAIProvider::with_config(
                OpenAIConfig::new(self.api_key.clone()).with_api_base(self.base_url.clone()),
            )?),
        })
    }
}

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// [`ChatModel`] that routes each call by model name
///
/// Providers are built lazily on first use of a route and then reused.
pub struct ModelRouter {
    lookup: EnvLookup,
    providers: Mutex<HashMap<&'static str, Arc<dyn LLMProvider>>>,
}

impl Default for ModelRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRouter {
    /// Router reading credentials from the process environment
    pub fn new() -> Self {
        Self::with_lookup(|key| std::env::var(key).ok())
    }

    /// Router reading credentials through `lookup`
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Arc::new(lookup),
            providers: Mutex::new(HashMap::new()),
        }
    }

    /// Use `provider` for every model on the route labelled `label`
    pub async fn insert_provider(&self, label: &'static str, provider: Arc<dyn LLMProvider>) {
        self.providers.lock().await.insert(label, provider);
    }

    /// Which routes have a credential configured
    pub fn key_status(&self) -> Vec<(&'static str, bool)> {
        ROUTES
            .iter()
            .map(|route| (route.label, route.resolve(|k| (self.lookup)(k)).is_ok()))
            .collect()
    }

    async fn provider_for(&self, route: ProviderRoute) -> Result<Arc<dyn LLMProvider>> {
        let mut providers = self.providers.lock().await;
        if let Some(provider) = providers.get(route.label) {
            return Ok(Arc::clone(provider));
        }

        let endpoint = route.resolve(|k| (self.lookup)(k))?;
        debug!(route = route.label, base_url = %endpoint.base_url, "Creating provider");
        let provider = endpoint.build_provider()?;
        providers.insert(route.label, Arc::clone(&provider));
        Ok(provider)
    }
}

#[async_trait]
impl ChatModel for ModelRouter {
    async fn get_response(&self, model: &str, prompt: &str, temperature: f32) -> Result<String> {
        let route = route_for(model);
        let provider = self.provider_for(route).await?;

        let request = CompletionRequest::builder(model)
            .prompt(prompt)
            .temperature(temperature)
            .max_tokens(MAX_TOKENS)
            .build();

        debug!(model, route = route.label, "Calling model");
        let response = provider.complete(request).await?;
        Ok(response.text)
    }
}
