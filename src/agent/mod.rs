//! Research agent
//!
//! Search, fetch and summarize components plus the orchestrator that runs them.

pub mod prompts;
pub mod research;
pub mod tools;

pub use research::{ResearchAgent, ResearchError};
