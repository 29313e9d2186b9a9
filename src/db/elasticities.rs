//! Persistence of computed elasticities.
//!
//! Three result tables, one per grouping key. Recomputation replaces the
//! full contents of all three inside a single transaction so readers never
//! see a half-written mix of old and new results.

use chrono::{DateTime, Utc};

use super::Db;
use crate::elasticity::{ElasticityFit, PriceType};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct ProductElasticity {
    pub product_id: i64,
    pub price_type: PriceType,
    pub fit: ElasticityFit,
}

#[derive(Debug, Clone)]
pub struct CustomerElasticity {
    pub customer_id: i64,
    pub price_type: PriceType,
    pub fit: ElasticityFit,
}

#[derive(Debug, Clone)]
pub struct PairElasticity {
    pub customer_id: i64,
    pub product_id: i64,
    pub price_type: PriceType,
    pub fit: ElasticityFit,
}

/// One batch run's worth of results, stamped with a single timestamp.
#[derive(Debug, Clone, Default)]
pub struct ComputedElasticities {
    pub products: Vec<ProductElasticity>,
    pub customers: Vec<CustomerElasticity>,
    pub pairs: Vec<PairElasticity>,
}

/// A persisted row read back from any of the result tables.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredElasticity {
    #[sqlx(default)]
    pub customer_id: Option<i64>,
    #[sqlx(default)]
    pub product_id: Option<i64>,
    pub price_type: String,
    pub intercept: f64,
    pub elasticity: f64,
    pub r_squared: f64,
    pub observations: i64,
}

impl Db {
    /// Replace the contents of all three result tables with this run's
    /// results, in one transaction.
    pub async fn store_elasticities(
        &self,
        results: &ComputedElasticities,
        computed_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM computed_product_elasticities")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM computed_customer_elasticities")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM computed_c_p_elasticities")
            .execute(&mut *tx)
            .await?;

        for row in &results.products {
            sqlx::query(
                r#"
                INSERT INTO computed_product_elasticities
                    (product_id, price_type, intercept, elasticity,
                     r_squared, observations, computed_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(row.product_id)
            .bind(row.price_type.as_str())
            .bind(row.fit.intercept)
            .bind(row.fit.elasticity)
            .bind(row.fit.r_squared)
            .bind(row.fit.observations as i64)
            .bind(computed_at)
            .execute(&mut *tx)
            .await?;
        }

        for row in &results.customers {
            sqlx::query(
                r#"
                INSERT INTO computed_customer_elasticities
                    (customer_id, price_type, intercept, elasticity,
                     r_squared, observations, computed_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(row.customer_id)
            .bind(row.price_type.as_str())
            .bind(row.fit.intercept)
            .bind(row.fit.elasticity)
            .bind(row.fit.r_squared)
            .bind(row.fit.observations as i64)
            .bind(computed_at)
            .execute(&mut *tx)
            .await?;
        }

        for row in &results.pairs {
            sqlx::query(
                r#"
                INSERT INTO computed_c_p_elasticities
                    (customer_id, product_id, price_type, intercept,
                     elasticity, r_squared, observations, computed_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(row.customer_id)
            .bind(row.product_id)
            .bind(row.price_type.as_str())
            .bind(row.fit.intercept)
            .bind(row.fit.elasticity)
            .bind(row.fit.r_squared)
            .bind(row.fit.observations as i64)
            .bind(computed_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn product_elasticities(&self) -> Result<Vec<StoredElasticity>> {
        Ok(sqlx::query_as(
            r#"
            SELECT product_id, price_type, intercept, elasticity,
                   r_squared, observations
            FROM computed_product_elasticities
            ORDER BY product_id, price_type
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn customer_elasticities(&self) -> Result<Vec<StoredElasticity>> {
        Ok(sqlx::query_as(
            r#"
            SELECT customer_id, price_type, intercept, elasticity,
                   r_squared, observations
            FROM computed_customer_elasticities
            ORDER BY customer_id, price_type
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn pair_elasticities(&self) -> Result<Vec<StoredElasticity>> {
        Ok(sqlx::query_as(
            r#"
            SELECT customer_id, product_id, price_type, intercept,
                   elasticity, r_squared, observations
            FROM computed_c_p_elasticities
            ORDER BY customer_id, product_id, price_type
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }
}
