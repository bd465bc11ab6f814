//! SKILL.md descriptors
//!
//! A descriptor is a Markdown file that opens with a YAML frontmatter block:
//!
//! ```text
//! ---
//! name: technical-indicators
//! description: Compute MA, MACD, RSI and Bollinger bands for a stored dataset
//! ---
//! # Usage notes for the model...
//! ```
//!
//! `name` and `description` are required and `name` must match the
//! directory the file lives in. Any other keys are kept as-is.

use crate::error::{Result, SkillError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File name every skill directory must contain
pub const DESCRIPTOR_FILE: &str = "SKILL.md";

const DELIMITER: &str = "---\n";

/// Parsed SKILL.md
#[derive(Debug, Clone, PartialEq)]
pub struct SkillDescriptor {
    pub name: String,
    /// Tells the model when the skill is relevant
    pub description: String,
    /// Frontmatter keys other than `name` and `description`
    pub extra: BTreeMap<String, serde_yaml::Value>,
    /// Markdown body after the frontmatter, trimmed
    pub instructions: String,
    /// Directory the descriptor was loaded from
    pub dir: PathBuf,
}

#[derive(Deserialize)]
struct Frontmatter {
    name: Option<String>,
    description: Option<String>,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_yaml::Value>,
}

impl SkillDescriptor {
    /// Parse descriptor text; `dir` is recorded but not checked
    ///
    /// CRLF line endings and a leading byte order mark are accepted, and the
    /// instructions come back with `\n` line endings.
    pub fn parse(content: &str, dir: impl Into<PathBuf>) -> Result<Self> {
        let content = content.trim_start_matches('\u{feff}').replace("\r\n", "\n");
        let rest = content.strip_prefix(DELIMITER).ok_or_else(|| {
            SkillError::Format("SKILL.md must start with YAML frontmatter (---)".to_string())
        })?;
        let (frontmatter, body) = rest
            .split_once(DELIMITER)
            .ok_or_else(|| SkillError::Format("YAML frontmatter must end with ---".to_string()))?;

        let value: serde_yaml::Value = serde_yaml::from_str(frontmatter)?;
        if !value.is_mapping() {
            return Err(SkillError::Format(
                "YAML frontmatter must be a mapping".to_string(),
            ));
        }
        let meta: Frontmatter = serde_yaml::from_value(value)?;

        Ok(Self {
            name: meta.name.ok_or(SkillError::MissingField("name"))?,
            description: meta
                .description
                .ok_or(SkillError::MissingField("description"))?,
            extra: meta.extra,
            instructions: body.trim().to_string(),
            dir: dir.into(),
        })
    }

    /// Load `<dir>/SKILL.md` and check the name against the directory
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(DESCRIPTOR_FILE);
        let content = fs::read_to_string(&path).map_err(|source| SkillError::Io {
            path: path.clone(),
            source,
        })?;
        let descriptor = Self::parse(&content, dir)?;

        let expected = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if descriptor.name != expected {
            return Err(SkillError::NameMismatch {
                expected,
                found: descriptor.name,
            });
        }
        Ok(descriptor)
    }

    /// Path of a file shipped inside the skill directory
    pub fn resource_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.dir.join(relative)
    }
}
