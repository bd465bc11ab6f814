//! Skills for the financial analysis agent
//!
//! A skill is a directory holding a `SKILL.md` descriptor. At start-up the
//! [`SkillOrchestrator`] walks the skills directory, parses each descriptor,
//! and pairs it with the implementation registered under the same name in
//! the [`SkillCatalog`]. Tool calls are then routed to whichever loaded skill
//! declares the tool.

pub mod builtin;
pub mod catalog;
pub mod descriptor;
pub mod error;
pub mod orchestrator;
pub mod skill;

pub use builtin::{ChartGenerationSkill, FinancialDataSkill, TechnicalIndicatorsSkill};
pub use catalog::{SkillCatalog, SkillFactory};
pub use descriptor::{DESCRIPTOR_FILE, SkillDescriptor};
pub use error::{Result, SkillError};
pub use orchestrator::{SkillOrchestrator, SkillSummary};
pub use skill::{Skill, SkillContext, SkillServices, failure};
