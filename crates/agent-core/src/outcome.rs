//! Outcome of a single agent run
//!
//! An [`AgentOutcome`] is what a caller gets back from one run: either a final
//! answer or a run-level error, together with the step history. The history is
//! preserved on failure so a caller can inspect what the model tried.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error reported when the iteration budget is spent without a final answer
pub const MAX_ITERATIONS_ERROR: &str = "达到最大迭代次数";

/// One step of an agent run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryEntry {
    /// The model asked for a tool and received an observation
    ToolCall {
        iteration: usize,
        thought: String,
        action: String,
        action_input: Value,
        result: Value,
    },
    /// The model replied with something that is not a tool call
    FinalAnswer { iteration: usize, content: String },
}

impl HistoryEntry {
    /// 1-based iteration the entry was recorded in
    pub fn iteration(&self) -> usize {
        match self {
            Self::ToolCall { iteration, .. } | Self::FinalAnswer { iteration, .. } => *iteration,
        }
    }

    /// Tool name, for tool-call entries
    pub fn action(&self) -> Option<&str> {
        match self {
            Self::ToolCall { action, .. } => Some(action),
            Self::FinalAnswer { .. } => None,
        }
    }

    /// Tool result, for tool-call entries
    pub fn result(&self) -> Option<&Value> {
        match self {
            Self::ToolCall { result, .. } => Some(result),
            Self::FinalAnswer { .. } => None,
        }
    }
}

/// Result of one agent run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl AgentOutcome {
    /// Successful run ending in `answer`
    pub fn finished(answer: impl Into<String>, history: Vec<HistoryEntry>) -> Self {
        Self {
            success: true,
            final_answer: Some(answer.into()),
            error: None,
            history,
        }
    }

    /// Failed run
    pub fn failed(error: impl Into<String>, history: Vec<HistoryEntry>) -> Self {
        Self {
            success: false,
            final_answer: None,
            error: Some(error.into()),
            history,
        }
    }

    /// Run that spent its whole iteration budget
    pub fn exhausted(history: Vec<HistoryEntry>) -> Self {
        Self::failed(MAX_ITERATIONS_ERROR, history)
    }

    /// True when the run failed because the budget ran out
    pub fn is_exhausted(&self) -> bool {
        !self.success && self.error.as_deref() == Some(MAX_ITERATIONS_ERROR)
    }

    /// Number of iterations recorded
    pub fn iterations(&self) -> usize {
        self.history.len()
    }

    /// Tool-call steps in order
    pub fn tool_calls(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history
            .iter()
            .filter(|entry| matches!(entry, HistoryEntry::ToolCall { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool_step(iteration: usize) -> HistoryEntry {
        HistoryEntry::ToolCall {
            iteration,
            thought: "先获取数据".to_string(),
            action: "fetch_stock_data".to_string(),
            action_input: json!({"symbol": "600519", "days": 30}),
            result: json!({"status": "success", "data_id": "data_1"}),
        }
    }

    #[test]
    fn test_history_entry_wire_shape() {
        let value = serde_json::to_value(tool_step(1)).unwrap();
        assert_eq!(value["type"], "tool_call");
        assert_eq!(value["iteration"], 1);
        assert_eq!(value["action"], "fetch_stock_data");
        assert_eq!(value["result"]["data_id"], "data_1");

        let final_step = HistoryEntry::FinalAnswer {
            iteration: 2,
            content: "分析完成".to_string(),
        };
        let value = serde_json::to_value(final_step).unwrap();
        assert_eq!(value, json!({"type": "final_answer", "iteration": 2, "content": "分析完成"}));
    }

    #[test]
    fn test_finished_outcome_omits_error() {
        let outcome = AgentOutcome::finished("done", vec![tool_step(1)]);
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["final_answer"], "done");
        assert!(value.get("error").is_none());
        assert_eq!(outcome.tool_calls().count(), 1);
    }

    #[test]
    fn test_exhausted_outcome() {
        let outcome = AgentOutcome::exhausted(vec![tool_step(1), tool_step(2)]);
        assert!(!outcome.success);
        assert!(outcome.is_exhausted());
        assert_eq!(outcome.error.as_deref(), Some(MAX_ITERATIONS_ERROR));
        assert_eq!(outcome.iterations(), 2);
        assert_eq!(outcome.history[1].iteration(), 2);
    }

    #[test]
    fn test_failed_outcome_is_not_exhausted() {
        let outcome = AgentOutcome::failed("network down", Vec::new());
        assert!(!outcome.is_exhausted());
        assert!(outcome.final_answer.is_none());
    }
}
