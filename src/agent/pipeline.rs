//! The two-step pipeline: SQL step, then analyst step, in order.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::analyst::AnalystStep;
use super::provider::LlmProvider;
use super::sql_agent::SqlStep;
use crate::db::Db;
use crate::error::Result;

/// Everything one pipeline run produced, for display or serialization.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AnalysisReport {
    pub question: String,
    pub sql: String,
    pub row_count: usize,
    pub result_summary: String,
    pub answer: String,
}

pub struct AnalysisPipeline {
    sql: SqlStep,
    analyst: AnalystStep,
}

impl AnalysisPipeline {
    pub fn new(provider: Arc<dyn LlmProvider>, db: Db) -> Self {
        Self {
            sql: SqlStep::new(provider.clone(), db),
            analyst: AnalystStep::new(provider),
        }
    }

    pub async fn run(&self, question: &str) -> Result<AnalysisReport> {
        let run_id = Uuid::new_v4();
        info!(%run_id, "Answering: {question}");

        let sql_output = self.sql.run(question).await?;
        info!(%run_id, "Query returned {} rows", sql_output.row_count);

        let answer = self.analyst.run(question, &sql_output).await?;
        info!(%run_id, "Analysis complete");

        Ok(AnalysisReport {
            question: question.to_string(),
            sql: sql_output.sql,
            row_count: sql_output.row_count,
            result_summary: sql_output.summary,
            answer,
        })
    }
}
