//! Concrete LLM provider implementations

pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::{OpenAIConfig, OpenAIProvider};

use crate::{LLMError, Result};

/// Join `path` onto a validated base URL
pub(crate) fn endpoint(base: &str, path: &str) -> Result<String> {
    url::Url::parse(base)
        .map_err(|e| LLMError::ConfigurationError(format!("Invalid base URL '{base}': {e}")))?;
    Ok(format!("{}/{}", base.trim_end_matches('/'), path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        assert_eq!(
            endpoint("https://open.bigmodel.cn/api/paas/v4/", "chat/completions").unwrap(),
            "https://open.bigmodel.cn/api/paas/v4/chat/completions"
        );
        assert_eq!(
            endpoint("https://api.deepseek.com", "chat/completions").unwrap(),
            "https://api.deepseek.com/chat/completions"
        );
    }

    #[test]
    fn test_endpoint_rejects_garbage() {
        assert!(matches!(
            endpoint("not a url", "messages"),
            Err(LLMError::ConfigurationError(_))
        ));
    }
}
