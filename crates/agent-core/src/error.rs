//! Error types for agent-core

use thiserror::Error;

/// Result type alias for agent-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for agent operations
#[derive(Error, Debug)]
pub enum Error {
    /// Generic error message
    #[error("{0}")]
    Generic(String),

    /// Agent initialization failed
    #[error("Agent initialization failed: {0}")]
    InitializationFailed(String),

    /// Agent processing failed
    #[error("Agent processing failed: {0}")]
    ProcessingFailed(String),

    /// A tool rejected its input or failed while running
    #[error("Tool '{tool}' failed: {message}")]
    ToolFailed { tool: String, message: String },

    /// The language model call failed
    #[error("Model call failed: {0}")]
    ModelFailed(String),

    /// Referenced dataset is not in the session store
    #[error("找不到数据 ID: {0}")]
    DatasetNotFound(String),
}

impl Error {
    /// Shorthand for a tool failure
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ProcessingFailed(format!("JSON error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_display() {
        let err = Error::tool("fetch_stock_data", "symbol not found");
        assert_eq!(
            err.to_string(),
            "Tool 'fetch_stock_data' failed: symbol not found"
        );
    }

    #[test]
    fn test_dataset_not_found_display() {
        let err = Error::DatasetNotFound("data_9".to_string());
        assert_eq!(err.to_string(), "找不到数据 ID: data_9");
    }
}
