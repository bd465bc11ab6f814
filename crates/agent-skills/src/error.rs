//! Error types for skill loading and dispatch

use agent_market::MarketError;
use std::path::PathBuf;
use thiserror::Error;

/// Skill specific errors
#[derive(Debug, Error)]
pub enum SkillError {
    /// Descriptor could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Frontmatter delimiters are wrong or the metadata is not a mapping
    #[error("{0}")]
    Format(String),

    /// Frontmatter is not valid YAML
    #[error("Invalid YAML in SKILL.md: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Required frontmatter key absent
    #[error("Missing required field '{0}' in SKILL.md frontmatter")]
    MissingField(&'static str),

    /// Declared name differs from the directory name
    #[error("Skill name '{found}' must match directory name '{expected}'")]
    NameMismatch { expected: String, found: String },

    /// Descriptor found but nothing in the catalog implements it
    #[error("No implementation registered for skill '{0}'")]
    NoImplementation(String),

    /// No loaded skill declares the tool
    #[error("Tool '{0}' not found in any skill")]
    UnknownTool(String),

    /// Background task failed
    #[error("Skill task failed: {0}")]
    Task(String),

    /// Market layer failure
    #[error(transparent)]
    Market(#[from] MarketError),
}

/// Result type alias for skill operations
pub type Result<T> = std::result::Result<T, SkillError>;

impl From<SkillError> for agent_core::Error {
    fn from(err: SkillError) -> Self {
        agent_core::Error::ProcessingFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SkillError::NameMismatch {
            expected: "chart-generation".to_string(),
            found: "charts".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Skill name 'charts' must match directory name 'chart-generation'"
        );
        assert_eq!(
            SkillError::MissingField("description").to_string(),
            "Missing required field 'description' in SKILL.md frontmatter"
        );
    }

    #[test]
    fn test_error_conversion() {
        let err: agent_core::Error = SkillError::UnknownTool("fly".to_string()).into();
        assert!(err.to_string().contains("Tool 'fly' not found"));
    }
}
