//! Agent runtime for the financial analysis agent
//!
//! This crate wires the model, the tools and the skills into a ReAct loop:
//!
//! - [`parser`]: pulls a tool call out of a free-text model reply
//! - [`legacy`]: the static tool table (`fetch_stock_data`, `fetch_etf_data`,
//!   `analyze_and_plot`)
//! - [`dispatch`]: the ordered skill tier / static table resolvers
//! - [`prompt`]: the date-aware system prompt
//! - [`executor`]: [`FinancialAgent`], the loop itself
//! - [`summary`]: terminal tables for a finished run

pub mod dispatch;
pub mod executor;
pub mod legacy;
pub mod parser;
pub mod prompt;
pub mod summary;

// Re-export key types
pub use dispatch::{LegacyResolver, SkillResolver, ToolDispatcher, ToolResolver, normalize_fetch_result};
pub use executor::{
    ExecutorConfig, ExecutorEventHandler, FinancialAgent, FinancialAgentBuilder, NoOpEventHandler,
    analyze_stock_query,
};
pub use legacy::{AnalyzeAndPlotTool, FetchDataTool, legacy_registry};
pub use parser::{ResponseParser, ToolCall, parse_tool_call};
pub use prompt::{PromptProvider, default_prompt_provider, fixed_prompt, render_system_prompt};
pub use summary::{render_analysis_tables, render_execution_summary};
