//! The two-step question pipeline and its LLM plumbing.
//!
//! Step one turns a natural-language question into a single SQLite query
//! and a summarized result; step two turns that summary into a narrative
//! answer. Both steps are straight calls through [`LlmProvider`]; there is
//! no branching, retry loop, or conversation state between them.

pub mod analyst;
pub mod pipeline;
pub mod prompts;
pub mod provider;
pub mod sql_agent;

pub use analyst::AnalystStep;
pub use pipeline::{AnalysisPipeline, AnalysisReport};
pub use provider::{ClaudeClient, LlmProvider};
pub use sql_agent::{SqlStep, SqlStepOutput};
