//! Tool-call extraction from free-text model replies
//!
//! The model asks for a tool by replying with a JSON object, usually inside
//! a fenced code block:
//!
//! ```text
//! {"thought": "...", "action": "fetch_stock_data", "action_input": {"symbol": "600519"}}
//! ```
//!
//! Anything that does not decode into an object with an `action` key is the
//! final answer.

use agent_core::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A structured tool request parsed from a model reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub thought: String,
    pub action: String,
    #[serde(default)]
    pub action_input: Value,
}

/// Compiled extraction patterns
#[derive(Debug, Clone)]
pub struct ResponseParser {
    json_block: Regex,
    any_block: Regex,
    trailing_comma: Regex,
}

impl ResponseParser {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| Error::InitializationFailed(format!("invalid parser pattern: {e}")))
        };
        Ok(Self {
            json_block: compile(r"(?s)```json\s*(.*?)\s*```")?,
            any_block: compile(r"(?s)```\s*(.*?)\s*```")?,
            trailing_comma: compile(r",(\s*[}\]])")?,
        })
    }

    /// Candidate JSON text: a ```json block, else any fenced block, else
    /// the whole reply when it opens with `{` or `[`
    pub fn extract_json<'a>(&self, text: &'a str) -> Option<&'a str> {
        if let Some(captures) = self.json_block.captures(text) {
            return captures.get(1).map(|m| m.as_str().trim());
        }
        if let Some(captures) = self.any_block.captures(text) {
            return captures.get(1).map(|m| m.as_str().trim());
        }
        let trimmed = text.trim();
        (trimmed.starts_with('{') || trimmed.starts_with('[')).then_some(trimmed)
    }

    /// Strict decode, then one retry with trailing commas removed
    pub fn lenient_decode(&self, raw: &str) -> Option<Value> {
        if raw.trim().is_empty() {
            return None;
        }
        if let Ok(value) = serde_json::from_str(raw) {
            return Some(value);
        }
        let repaired = self.trailing_comma.replace_all(raw, "$1");
        serde_json::from_str(&repaired).ok()
    }

    /// Parse a reply into a tool call, `None` when it is a final answer
    pub fn parse(&self, text: &str) -> Option<ToolCall> {
        let raw = self.extract_json(text)?;
        let Value::Object(mut object) = self.lenient_decode(raw)? else {
            return None;
        };

        let action = match object.remove("action")? {
            Value::String(action) => action,
            _ => return None,
        };
        let thought = match object.remove("thought") {
            Some(Value::String(thought)) => thought,
            _ => String::new(),
        };
        let action_input = match object.remove("action_input") {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(input) => input,
        };

        Some(ToolCall {
            thought,
            action,
            action_input,
        })
    }
}

/// Parse with a freshly compiled [`ResponseParser`]
pub fn parse_tool_call(text: &str) -> Option<ToolCall> {
    ResponseParser::new().ok()?.parse(text)
}
