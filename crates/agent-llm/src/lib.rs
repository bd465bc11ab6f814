//! LLM provider layer for the financial analysis agent
//!
//! This crate provides:
//!
//! - Conversation types (role-tagged messages and the serialized transcript)
//! - Completion request/response types
//! - The [`LLMProvider`] trait with Anthropic and OpenAI-compatible providers
//! - The [`ChatModel`] seam used by the agent loop, implemented by
//!   [`ModelRouter`], which picks a provider from the model name

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod providers;
pub mod router;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{Conversation, Message, Role};
pub use provider::{ChatModel, LLMProvider};
pub use router::{ModelRouter, Protocol, ProviderEndpoint, ProviderRoute, route_for};
