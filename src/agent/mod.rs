//! LLM agent modules for answering survey questions.
//!
//! This module provides the tool-calling agent and the survey tools it
//! exposes to the model.

pub mod agent_loop;
pub mod tools;

pub use agent_loop::{AgentConfig, InsightAgent};
