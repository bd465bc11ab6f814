//! Skill discovery and dispatch

use crate::catalog::SkillCatalog;
use crate::descriptor::{DESCRIPTOR_FILE, SkillDescriptor};
use crate::error::{Result, SkillError};
use crate::skill::{Skill, SkillContext, SkillServices};
use agent_tools::ToolSignature;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Listing entry for one loaded skill
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillSummary {
    pub name: String,
    pub description: String,
    pub tools: Vec<String>,
}

/// Loaded skills in discovery order
///
/// Read-only once loaded. A tool name is served by the first skill that
/// declares it.
pub struct SkillOrchestrator {
    root: PathBuf,
    skills: Vec<Box<dyn Skill>>,
}

impl SkillOrchestrator {
    /// Orchestrator with no skills
    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            skills: Vec::new(),
        }
    }

    /// Discover and load every skill under `root`
    ///
    /// Subdirectories are visited in lexicographic order. Names starting
    /// with `_` or `.` and directories without `SKILL.md` are skipped. A
    /// skill that fails to load is logged and left out; a missing root gives
    /// an empty orchestrator.
    pub fn load(root: impl Into<PathBuf>, catalog: &SkillCatalog, services: &SkillServices) -> Self {
        let mut orchestrator = Self::empty(root);

        let entries = match fs::read_dir(&orchestrator.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %orchestrator.root.display(), error = %e, "Skills directory not readable");
                return orchestrator;
            }
        };

        let mut dirs: Vec<PathBuf> = entries
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| !n.starts_with('_') && !n.starts_with('.'))
            })
            .filter(|path| path.join(DESCRIPTOR_FILE).is_file())
            .collect();
        dirs.sort();

        for dir in dirs {
            match Self::load_one(&dir, catalog, services) {
                Ok(skill) => {
                    info!(skill = %skill.name(), tools = skill.list_tool_signatures().len(), "Loaded skill");
                    orchestrator.register(skill);
                }
                Err(e) => warn!(dir = %dir.display(), error = %e, "Failed to load skill"),
            }
        }
        orchestrator
    }

    fn load_one(dir: &Path, catalog: &SkillCatalog, services: &SkillServices) -> Result<Box<dyn Skill>> {
        let descriptor = SkillDescriptor::load(dir)?;
        catalog.build(SkillContext {
            descriptor,
            services: services.clone(),
        })
    }

    /// Add a skill after discovery
    pub fn register(&mut self, skill: Box<dyn Skill>) {
        self.skills.push(skill);
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn skills(&self) -> impl Iterator<Item = &dyn Skill> {
        self.skills.iter().map(|skill| skill.as_ref())
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn skill_names(&self) -> Vec<&str> {
        self.skills.iter().map(|s| s.name()).collect()
    }

    pub fn get_skill(&self, name: &str) -> Option<&dyn Skill> {
        self.skills().find(|s| s.name() == name)
    }

    /// Signatures of every loaded skill, in load order
    pub fn all_tool_signatures(&self) -> Vec<ToolSignature> {
        self.skills
            .iter()
            .flat_map(|s| s.list_tool_signatures())
            .collect()
    }

    /// First skill declaring `tool`
    pub fn find_skill_for_tool(&self, tool: &str) -> Option<&dyn Skill> {
        self.skills().find(|s| s.declares(tool))
    }

    /// Route a call to the skill that declares it
    pub async fn execute_tool(&self, tool: &str, args: Value) -> Result<Value> {
        let skill = self
            .find_skill_for_tool(tool)
            .ok_or_else(|| SkillError::UnknownTool(tool.to_string()))?;
        debug!(skill = %skill.name(), tool, "Dispatching to skill");
        skill.invoke(tool, args).await
    }

    /// One entry per loaded skill
    pub fn summary(&self) -> Vec<SkillSummary> {
        self.skills()
            .map(|s| SkillSummary {
                name: s.name().to_string(),
                description: s.descriptor().description.clone(),
                tools: s
                    .list_tool_signatures()
                    .into_iter()
                    .map(|sig| sig.name)
                    .collect(),
            })
            .collect()
    }
}
