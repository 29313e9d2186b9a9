//! Step one: question → SQL → summarized result.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

use super::prompts;
use super::provider::LlmProvider;
use crate::db::Db;
use crate::error::Result;

static SQL_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:sql)?\s*(.*?)```").expect("fence regex is valid")
});

/// Output of the SQL step, handed to the analyst step.
#[derive(Debug, Clone)]
pub struct SqlStepOutput {
    pub sql: String,
    pub row_count: usize,
    pub summary: String,
}

pub struct SqlStep {
    provider: Arc<dyn LlmProvider>,
    db: Db,
}

impl SqlStep {
    pub fn new(provider: Arc<dyn LlmProvider>, db: Db) -> Self {
        Self { provider, db }
    }

    /// Generate one SELECT for the question, execute it through the
    /// read-only guard, and summarize the result.
    pub async fn run(&self, question: &str) -> Result<SqlStepOutput> {
        let response = self
            .provider
            .complete(&prompts::sql_system_prompt(), question)
            .await?;

        let sql = extract_sql(&response);
        debug!("Generated SQL: {sql}");

        let output = self.db.run_readonly_query(&sql).await?;
        Ok(SqlStepOutput {
            sql: output.sql,
            row_count: output.row_count,
            summary: output.rendered,
        })
    }
}

/// Pull the statement out of a model response, tolerating code fences.
pub fn extract_sql(response: &str) -> String {
    if let Some(captures) = SQL_FENCE.captures(response) {
        return captures[1].trim().to_string();
    }
    response.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::test_support::ScriptedProvider;
    use crate::error::Error;

    #[test]
    fn extracts_from_sql_fence() {
        let response = "Here you go:\n```sql\nSELECT * FROM orders\n```";
        assert_eq!(extract_sql(response), "SELECT * FROM orders");
    }

    #[test]
    fn extracts_from_plain_fence() {
        let response = "```\nSELECT product_id FROM products\n```";
        assert_eq!(extract_sql(response), "SELECT product_id FROM products");
    }

    #[test]
    fn passes_through_bare_sql() {
        assert_eq!(
            extract_sql("  SELECT COUNT(*) FROM orders;  "),
            "SELECT COUNT(*) FROM orders;"
        );
    }

    #[tokio::test]
    async fn executes_generated_select() {
        let db = crate::db::Db::connect_in_memory().await.unwrap();
        let provider = Arc::new(ScriptedProvider::new(&[
            "```sql\nSELECT COUNT(*) AS order_count FROM orders\n```",
        ]));

        let step = SqlStep::new(provider, db);
        let output = step.run("How many orders are there?").await.unwrap();

        assert_eq!(output.sql, "SELECT COUNT(*) AS order_count FROM orders");
        assert_eq!(output.row_count, 1);
        assert!(output.summary.contains("order_count"));
    }

    #[tokio::test]
    async fn rejects_generated_writes() {
        let db = crate::db::Db::connect_in_memory().await.unwrap();
        let provider = Arc::new(ScriptedProvider::new(&["DELETE FROM orders"]));

        let step = SqlStep::new(provider, db);
        let err = step.run("Clear the orders table").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
