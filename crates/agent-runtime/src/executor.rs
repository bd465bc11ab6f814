//! ReAct executor for the financial analysis agent
//!
//! Each iteration:
//! 1. Send the whole transcript to the model as one prompt
//! 2. Parse the reply as a tool call
//! 3. If it is one, dispatch it, append the reply and the observation, loop
//! 4. Otherwise the reply is the final answer
//!
//! Tool failures come back as observations. Only a model error or running
//! out of iterations ends a run unsuccessfully.

use crate::dispatch::ToolDispatcher;
use crate::parser::{ResponseParser, ToolCall};
use crate::prompt::{PromptProvider, default_prompt_provider};
use agent_core::{Agent, AgentOutcome, Error, HistoryEntry, MAX_ITERATIONS_ERROR, Result};
use agent_llm::{ChatModel, Conversation, Message};
use agent_market::DateRange;
use agent_utils::preview;
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Characters of model replies and tool results shown in logs
const LOG_PREVIEW_CHARS: usize = 200;

/// Event handler for agent execution events
///
/// Implement this trait to follow a run as it happens, e.g. to print
/// progress in a terminal.
#[async_trait]
pub trait ExecutorEventHandler: Send + Sync {
    /// Called when an iteration starts (1-based)
    async fn on_iteration(&self, _iteration: usize, _max_iterations: usize) {}

    /// Called before a tool call is dispatched
    async fn on_tool_start(&self, _call: &ToolCall) {}

    /// Called with the tool result
    async fn on_tool_done(&self, _name: &str, _result: &Value, _duration_ms: u64) {}

    /// Called when the model produces its final answer
    async fn on_complete(&self, _answer: &str) {}

    /// Called when the run fails
    async fn on_error(&self, _error: &str) {}
}

/// No-op event handler for when events are not needed
pub struct NoOpEventHandler;

#[async_trait]
impl ExecutorEventHandler for NoOpEventHandler {}

/// Configuration for agent execution
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorConfig {
    /// Model name, also used to pick the provider
    pub model: String,

    /// Maximum number of model calls per run
    pub max_iterations: usize,

    /// Sampling temperature; 0 keeps tool-call JSON stable
    pub temperature: f32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_iterations: 5,
            temperature: 0.0,
        }
    }
}

/// The financial analysis agent
pub struct FinancialAgent {
    name: String,
    model: Arc<dyn ChatModel>,
    dispatcher: Arc<ToolDispatcher>,
    parser: ResponseParser,
    prompt: PromptProvider,
    config: ExecutorConfig,
    event_handler: Option<Arc<dyn ExecutorEventHandler>>,
}

impl FinancialAgent {
    pub fn builder() -> FinancialAgentBuilder {
        FinancialAgentBuilder::new()
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    /// Set the event handler for receiving execution events
    pub fn set_event_handler(&mut self, handler: Arc<dyn ExecutorEventHandler>) {
        self.event_handler = Some(handler);
    }

    /// Run one query to completion
    pub async fn run(&self, query: &str) -> AgentOutcome {
        let handler = self.event_handler.as_deref();

        let system_prompt = match (self.prompt)() {
            Ok(prompt) => prompt,
            Err(e) => {
                error!(error = %e, "System prompt unavailable");
                if let Some(handler) = handler {
                    handler.on_error(&e.to_string()).await;
                }
                return AgentOutcome::failed(e.to_string(), Vec::new());
            }
        };

        let mut conversation = Conversation::with_prompt(system_prompt, query);
        let mut history = Vec::new();
        let max_iterations = self.config.max_iterations;

        for iteration in 1..=max_iterations {
            info!(iteration, max_iterations, "Agent iteration started");
            if let Some(handler) = handler {
                handler.on_iteration(iteration, max_iterations).await;
            }

            let prompt = conversation.transcript();
            debug!(model = %self.config.model, prompt_chars = prompt.chars().count(), "Sending prompt to model");
            let response = match self
                .model
                .get_response(&self.config.model, &prompt, self.config.temperature)
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    error!(iteration, error = %e, "Model call failed");
                    if let Some(handler) = handler {
                        handler.on_error(&e.to_string()).await;
                    }
                    return AgentOutcome::failed(e.to_string(), history);
                }
            };
            debug!(response_preview = %preview(&response, LOG_PREVIEW_CHARS), "Model response received");

            let Some(call) = self.parser.parse(&response) else {
                info!(iteration, answer_chars = response.chars().count(), "Agent completed");
                if let Some(handler) = handler {
                    handler.on_complete(&response).await;
                }
                history.push(HistoryEntry::FinalAnswer {
                    iteration,
                    content: response.clone(),
                });
                return AgentOutcome::finished(response, history);
            };

            info!(
                iteration,
                tool = %call.action,
                thought = %preview(&call.thought, LOG_PREVIEW_CHARS),
                "Agent requested tool"
            );
            if let Some(handler) = handler {
                handler.on_tool_start(&call).await;
            }

            let started = Instant::now();
            let result = self.dispatcher.execute(&call.action, &call.action_input).await;
            let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            let observation = serde_json::to_string_pretty(&result).unwrap_or_else(|_| result.to_string());
            let status = result.get("status").and_then(Value::as_str).unwrap_or("unknown");
            info!(tool = %call.action, status, duration_ms, "Tool call finished");
            debug!(result_preview = %preview(&observation, LOG_PREVIEW_CHARS), "Tool result");
            if let Some(handler) = handler {
                handler.on_tool_done(&call.action, &result, duration_ms).await;
            }

            conversation.push(Message::assistant(response));
            conversation.push(Message::user(format!("工具执行结果：\n{observation}")));

            let ToolCall {
                thought,
                action,
                action_input,
            } = call;
            history.push(HistoryEntry::ToolCall {
                iteration,
                thought,
                action,
                action_input,
                result,
            });
        }

        warn!(max_iterations, "Max iterations reached without a final answer");
        if let Some(handler) = handler {
            handler.on_error(MAX_ITERATIONS_ERROR).await;
        }
        AgentOutcome::exhausted(history)
    }

    /// Analyse `symbol` over the trailing `days` days
    pub async fn analyze_stock(&self, symbol: &str, days: i64) -> AgentOutcome {
        let query = match analyze_stock_query(symbol, days, Local::now().date_naive()) {
            Ok(query) => query,
            Err(e) => {
                warn!(symbol, days, error = %e, "Rejected analysis window");
                if let Some(handler) = self.event_handler.as_deref() {
                    handler.on_error(&e.to_string()).await;
                }
                return AgentOutcome::failed(e.to_string(), Vec::new());
            }
        };
        info!(symbol, days, "Starting stock analysis");
        self.run(&query).await
    }
}

/// Query used by [`FinancialAgent::analyze_stock`]
pub fn analyze_stock_query(symbol: &str, days: i64, today: NaiveDate) -> Result<String> {
    let range = DateRange::trailing(days, today)?;
    Ok(format!(
        "请帮我分析股票 {symbol} 最近 {days} 天的走势，时间范围是 {} 到 {}。",
        range.start_compact(),
        range.end_compact()
    ))
}

#[async_trait]
impl Agent for FinancialAgent {
    async fn run(&self, query: &str) -> AgentOutcome {
        FinancialAgent::run(self, query).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Builder for [`FinancialAgent`]
pub struct FinancialAgentBuilder {
    name: String,
    model: Option<Arc<dyn ChatModel>>,
    dispatcher: Option<Arc<ToolDispatcher>>,
    prompt: Option<PromptProvider>,
    config: ExecutorConfig,
    event_handler: Option<Arc<dyn ExecutorEventHandler>>,
}

impl FinancialAgentBuilder {
    pub fn new() -> Self {
        Self {
            name: "financial-analyst".to_string(),
            model: None,
            dispatcher: None,
            prompt: None,
            config: ExecutorConfig::default(),
            event_handler: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the chat model
    pub fn chat_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Set the tool dispatcher
    pub fn dispatcher(mut self, dispatcher: Arc<ToolDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Replace the system prompt provider
    pub fn prompt_provider(mut self, prompt: PromptProvider) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Set the full configuration
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the model name
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set maximum iterations
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    pub fn event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Build the agent
    pub fn build(self) -> Result<FinancialAgent> {
        let model = self
            .model
            .ok_or_else(|| Error::InitializationFailed("Chat model not set".to_string()))?;
        let dispatcher = self
            .dispatcher
            .ok_or_else(|| Error::InitializationFailed("Tool dispatcher not set".to_string()))?;
        if self.config.max_iterations == 0 {
            return Err(Error::InitializationFailed(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        Ok(FinancialAgent {
            name: self.name,
            model,
            dispatcher,
            parser: ResponseParser::new()?,
            prompt: self.prompt.unwrap_or_else(default_prompt_provider),
            config: self.config,
            event_handler: self.event_handler,
        })
    }
}

impl Default for FinancialAgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
