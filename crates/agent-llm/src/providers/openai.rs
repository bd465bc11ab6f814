//! OpenAI-compatible provider implementation
//!
//! Speaks the chat completions API. The same provider serves OpenAI itself and
//! the compatible endpoints of Qwen, Zhipu GLM, DeepSeek and Moonshot; only the
//! base URL and key differ.
//!
//! ```no_run
//! use agent_llm::{CompletionRequest, LLMProvider};
//! use agent_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! # async fn run() -> agent_llm::Result<()> {
//! let config = OpenAIConfig::new("sk-...")
//!     .with_api_base("https://api.deepseek.com")
//!     .with_timeout(60);
//! let provider = OpenAIProvider::with_config(config)?;
//!
//! let request = CompletionRequest::builder("deepseek-chat").prompt("你好").build();
//! let response = provider.complete(request).await?;
//! println!("{}", response.text);
//! # Ok(())
//! # }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, Result, Role,
    TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the OpenAI-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication
    pub api_key: String,

    /// Base URL of the chat completions API
    pub api_base: String,

    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Read `OPENAI_API_KEY` and optionally `OPENAI_BASE_URL`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            LLMError::ConfigurationError("OPENAI_API_KEY environment variable not set".to_string())
        })?;

        let api_base = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_OPENAI_API_BASE.to_string());

        Ok(Self::new(api_key).with_api_base(api_base))
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// OpenAI-compatible provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a provider with custom configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a provider with API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    /// Create a provider from environment variables
    pub fn from_env() -> Result<Self> {
        Self::with_config(OpenAIConfig::from_env()?)
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to OpenAI-compatible API");

        let body = OpenAIRequest {
            model: &request.model,
            messages: build_openai_messages(request.system.as_deref(), &request.messages),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(super::endpoint(&self.config.api_base, "chat/completions")?)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await?;
            return Err(LLMError::from_status(status, &request.model, error_text));
        }

        let parsed: OpenAIResponse = response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        parsed.into_completion()
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// OpenAI-specific request/response types

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, PartialEq)]
struct OpenAIMessage<'a> {
    role: &'static str,
    content: &'a str,
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

/// System prompt first, then the conversation in order
fn build_openai_messages<'a>(
    system: Option<&'a str>,
    messages: &'a [Message],
) -> Vec<OpenAIMessage<'a>> {
    system
        .map(|content| OpenAIMessage {
            role: "system",
            content,
        })
        .into_iter()
        .chain(messages.iter().map(|m| OpenAIMessage {
            role: role_name(m.role),
            content: &m.content,
        }))
        .collect()
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

impl OpenAIResponse {
    fn into_completion(self) -> Result<CompletionResponse> {
        let usage = self
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        let choice = self.choices.into_iter().next().ok_or_else(|| {
            LLMError::UnexpectedResponse("No choices in response".to_string())
        })?;

        debug!(
            finish_reason = ?choice.finish_reason,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "Received response"
        );

        Ok(CompletionResponse {
            text: choice.message.content.unwrap_or_default(),
            stop_reason: choice.finish_reason,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_builders() {
        let config = OpenAIConfig::new("sk-test")
            .with_api_base("https://api.moonshot.cn/v1")
            .with_timeout(30);

        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.api_base, "https://api.moonshot.cn/v1");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_provider_creation() {
        let provider = OpenAIProvider::new("sk-test").unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.config().api_base, DEFAULT_OPENAI_API_BASE);
    }

    #[test]
    fn test_build_messages_puts_system_first() {
        let messages = vec![Message::user("问题"), Message::assistant("回答")];
        let built = build_openai_messages(Some("系统"), &messages);

        assert_eq!(built.len(), 3);
        assert_eq!(built[0], OpenAIMessage { role: "system", content: "系统" });
        assert_eq!(built[1].role, "user");
        assert_eq!(built[2].role, "assistant");
    }

    #[test]
    fn test_build_messages_without_system() {
        let messages = vec![Message::user("问题")];
        let built = build_openai_messages(None, &messages);
        assert_eq!(built.len(), 1);
    }

    #[test]
    fn test_request_serialization() {
        let messages = vec![Message::user("hello")];
        let request = OpenAIRequest {
            model: "gpt-4o-mini",
            messages: build_openai_messages(None, &messages),
            max_tokens: 2000,
            temperature: Some(0.0),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["temperature"], 0.0);
        assert_eq!(value["messages"][0], json!({"role": "user", "content": "hello"}));
    }

    #[test]
    fn test_response_parsing() {
        let raw = json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "```json\n{\"action\": \"x\"}\n```"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        });
        let parsed: OpenAIResponse = serde_json::from_value(raw).unwrap();
        let completion = parsed.into_completion().unwrap();

        assert!(completion.text.contains("\"action\""));
        assert_eq!(completion.stop_reason.as_deref(), Some("stop"));
        assert_eq!(completion.usage.input_tokens, 10);
    }

    #[test]
    fn test_response_without_choices() {
        let parsed: OpenAIResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(
            parsed.into_completion(),
            Err(LLMError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_response_with_null_content() {
        let raw = json!({"choices": [{"message": {"content": null}, "finish_reason": "stop"}]});
        let parsed: OpenAIResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.into_completion().unwrap().text, "");
    }
}
