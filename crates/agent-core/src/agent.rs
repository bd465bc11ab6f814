//! Core Agent trait definition

use crate::{AgentOutcome, Error, Result};
use async_trait::async_trait;

/// Core trait that all agents must implement
///
/// `run` never fails at the Rust level: tool and model problems are reported
/// inside the returned [`AgentOutcome`]. `process` is the string-in/string-out
/// convenience that turns a failed outcome into an [`Error`].
#[async_trait]
pub trait Agent: Send + Sync {
    /// Run one query to completion
    async fn run(&self, query: &str) -> AgentOutcome;

    /// Get the agent's name
    fn name(&self) -> &str;

    /// Run a query and return only the final answer
    async fn process(&self, query: &str) -> Result<String> {
        let outcome = self.run(query).await;
        match outcome.final_answer {
            Some(answer) if outcome.success => Ok(answer),
            _ => Err(Error::ProcessingFailed(
                outcome.error.unwrap_or_else(|| "unknown error".to_string()),
            )),
        }
    }
}
