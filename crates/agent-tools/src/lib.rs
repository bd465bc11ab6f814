//! Tool framework for the financial analysis agent
//!
//! Tools are the named actions the model can request. This crate defines the
//! [`Tool`] trait, the [`ToolSignature`] advertised for each tool, and the
//! [`ToolRegistry`] static name-to-tool table that never lets an error escape.

pub mod registry;
pub mod signature;
pub mod tool;

pub use registry::{ToolRegistry, error_result};
pub use signature::{ToolSignature, schema};
pub use tool::Tool;
