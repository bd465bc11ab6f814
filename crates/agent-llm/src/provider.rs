//! Provider traits

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// Trait for LLM providers
///
/// Implementations speak one wire protocol (Anthropic messages or the
/// OpenAI-compatible chat completions API).
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion from the LLM
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the provider name (e.g., "anthropic", "openai")
    fn name(&self) -> &str;
}

/// Text-in/text-out model access used by the agent loop
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send `prompt` to `model` and return the generated text
    async fn get_response(&self, model: &str, prompt: &str, temperature: f32) -> Result<String>;
}
