//! Core abstractions for the financial analysis agent
//!
//! This crate defines the types shared by every layer of the workspace: the
//! [`Agent`] trait, the outcome of a single agent run, and the common error type.

pub mod agent;
pub mod error;
pub mod outcome;

pub use agent::Agent;
pub use error::{Error, Result};
pub use outcome::{AgentOutcome, HistoryEntry, MAX_ITERATIONS_ERROR};
