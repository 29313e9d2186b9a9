//! Read-only dynamic query execution for the agent pipeline.
//!
//! The SQL step hands us model-generated text; nothing here is trusted.
//! A statement must be a single `SELECT` (or `WITH`) and must not contain
//! any keyword that could write. The guard is deliberately conservative: a
//! legitimate `SELECT` using e.g. the `replace()` function is rejected
//! rather than risk letting a mutation through.

use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use super::Db;
use crate::error::{Error, Result};

/// Rows rendered into the summary handed to the analyst step.
pub const MAX_RENDERED_ROWS: usize = 50;

static FORBIDDEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(insert|update|delete|drop|alter|create|replace|truncate|attach|detach|pragma|vacuum|reindex)\b",
    )
    .expect("forbidden-keyword regex is valid")
});

/// Result of executing a generated query.
#[derive(Debug, Clone)]
pub struct QueryOutput {
    pub sql: String,
    pub row_count: usize,
    /// Column header plus up to [`MAX_RENDERED_ROWS`] rows as aligned text.
    pub rendered: String,
}

/// Reject anything that is not a single read-only statement.
pub fn ensure_read_only(sql: &str) -> Result<()> {
    let trimmed = sql.trim().trim_end_matches(';').trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("empty SQL statement".to_string()));
    }
    if trimmed.contains(';') {
        return Err(Error::Validation(
            "multiple SQL statements are not allowed".to_string(),
        ));
    }

    let first = trimmed
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    if first != "select" && first != "with" {
        return Err(Error::Validation(format!(
            "only SELECT statements are allowed, got '{first}'"
        )));
    }

    if let Some(found) = FORBIDDEN.find(trimmed) {
        return Err(Error::Validation(format!(
            "statement contains forbidden keyword '{}'",
            found.as_str().to_ascii_lowercase()
        )));
    }

    Ok(())
}

impl Db {
    /// Execute a model-generated statement after the read-only guard and
    /// render the result for the analyst step.
    pub async fn run_readonly_query(&self, sql: &str) -> Result<QueryOutput> {
        ensure_read_only(sql)?;

        let statement = sql.trim().trim_end_matches(';').trim().to_string();
        let rows = sqlx::query(&statement).fetch_all(&self.pool).await?;
        let rendered = render_rows(&rows)?;

        Ok(QueryOutput {
            sql: statement,
            row_count: rows.len(),
            rendered,
        })
    }
}

fn render_rows(rows: &[SqliteRow]) -> Result<String> {
    let Some(first) = rows.first() else {
        return Ok("(no rows)".to_string());
    };

    let header: Vec<&str> = first.columns().iter().map(|c| c.name()).collect();
    let mut out = header.join(" | ");
    out.push('\n');
    out.push_str(&"-".repeat(out.len().saturating_sub(1)));

    for row in rows.iter().take(MAX_RENDERED_ROWS) {
        let mut values = Vec::with_capacity(header.len());
        for index in 0..header.len() {
            values.push(render_value(row, index)?);
        }
        out.push('\n');
        out.push_str(&values.join(" | "));
    }

    if rows.len() > MAX_RENDERED_ROWS {
        out.push_str(&format!("\n(… {} more rows)", rows.len() - MAX_RENDERED_ROWS));
    }

    Ok(out)
}

fn render_value(row: &SqliteRow, index: usize) -> Result<String> {
    let type_name = {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            return Ok("NULL".to_string());
        }
        raw.type_info().name().to_string()
    };

    let value = match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => row.try_get::<i64, _>(index)?.to_string(),
        "REAL" => {
            let v = row.try_get::<f64, _>(index)?;
            format!("{v:.4}")
        }
        "BLOB" => format!("<blob {} bytes>", row.try_get::<Vec<u8>, _>(index)?.len()),
        _ => row.try_get::<String, _>(index)?,
    };
    Ok(value)
}
