//! Prompt construction for both pipeline steps.

/// The tables the SQL step may query, one line per table.
pub const SCHEMA_SUMMARY: &str = "\
orders(order_id, retailer_id, store_id, customer_id, timestamp, product_id, quantity, regular_price, sale_price)
products(product_id, retailer_id, store_id, product_name, product_description, category_name, department_name)
computed_product_elasticities(product_id, price_type, intercept, elasticity, r_squared, observations, computed_at)
computed_customer_elasticities(customer_id, price_type, intercept, elasticity, r_squared, observations, computed_at)
computed_c_p_elasticities(customer_id, product_id, price_type, intercept, elasticity, r_squared, observations, computed_at)";

pub fn sql_system_prompt() -> String {
    format!(
        "You are a SQL analyst for a SQLite retail pricing database. Given a \
         question, respond with exactly one syntactically correct SQLite SELECT \
         statement that retrieves the relevant information.\n\n\
         Tables:\n{SCHEMA_SUMMARY}\n\n\
         Rules:\n\
         - Respond with the SQL statement only, no explanation.\n\
         - Never write data: no INSERT, UPDATE, DELETE, DROP, or other DML/DDL.\n\
         - price_type is 'regular' or 'sale'; elasticity values are stored as \
           magnitudes (absolute values).\n\
         - Limit output to at most 50 rows unless the question requires more."
    )
}

pub const ANALYST_SYSTEM_PROMPT: &str =
    "You are a pricing analyst. Given a question and the result of a database \
     query, provide a clear, concise answer with insights and recommendations \
     about pricing strategy. Do not write SQL here; only analyze the provided \
     context. Elasticity magnitudes above 1 mean demand is price-sensitive; \
     below 1, insensitive.";

pub fn analyst_prompt(question: &str, sql: &str, summary: &str) -> String {
    format!("Question: {question}\n\nSQL used:\n{sql}\n\nQuery result:\n{summary}")
}
