//! Static catalog of skill implementations
//!
//! Descriptors are discovered on disk, implementations are compiled in. The
//! catalog joins the two by skill name.

use crate::builtin::{ChartGenerationSkill, FinancialDataSkill, TechnicalIndicatorsSkill};
use crate::error::{Result, SkillError};
use crate::skill::{Skill, SkillContext};
use std::collections::BTreeMap;

/// Builds a skill from its context
pub type SkillFactory = fn(SkillContext) -> Box<dyn Skill>;

/// Name to factory map
#[derive(Clone, Default)]
pub struct SkillCatalog {
    factories: BTreeMap<String, SkillFactory>,
}

impl SkillCatalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the three built-in skills
    pub fn builtin() -> Self {
        Self::new()
            .with(FinancialDataSkill::NAME, FinancialDataSkill::factory)
            .with(TechnicalIndicatorsSkill::NAME, TechnicalIndicatorsSkill::factory)
            .with(ChartGenerationSkill::NAME, ChartGenerationSkill::factory)
    }

    /// Add or replace a factory
    pub fn with(mut self, name: impl Into<String>, factory: SkillFactory) -> Self {
        self.register(name, factory);
        self
    }

    pub fn register(&mut self, name: impl Into<String>, factory: SkillFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Instantiate the skill named by the context's descriptor
    pub fn build(&self, context: SkillContext) -> Result<Box<dyn Skill>> {
        let factory = self
            .factories
            .get(&context.descriptor.name)
            .ok_or_else(|| SkillError::NoImplementation(context.descriptor.name.clone()))?;
        Ok(factory(context))
    }
}
