//! Step two: (question, summarized result) → narrative answer.

use std::sync::Arc;

use super::prompts;
use super::provider::LlmProvider;
use super::sql_agent::SqlStepOutput;
use crate::error::Result;

pub struct AnalystStep {
    provider: Arc<dyn LlmProvider>,
}

impl AnalystStep {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub async fn run(&self, question: &str, sql_output: &SqlStepOutput) -> Result<String> {
        let prompt = prompts::analyst_prompt(question, &sql_output.sql, &sql_output.summary);
        self.provider
            .complete(prompts::ANALYST_SYSTEM_PROMPT, &prompt)
            .await
    }
}
