//! Order and product rows: the upstream tables the estimator consumes.

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use tracing::debug;

use super::Db;
use crate::elasticity::{PricePoint, PriceType};
use crate::error::Result;

/// The slice of an order the estimator needs.
#[derive(Debug, Clone, Copy, PartialEq, sqlx::FromRow)]
pub struct OrderRow {
    pub customer_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub regular_price: f64,
    pub sale_price: f64,
}

impl OrderRow {
    pub fn price_point(&self, price_type: PriceType) -> PricePoint {
        let price = match price_type {
            PriceType::Regular => self.regular_price,
            PriceType::Sale => self.sale_price,
        };
        PricePoint {
            price,
            quantity: self.quantity as f64,
        }
    }
}

/// An order to insert, as produced by the seed generator or an importer.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub retailer_id: i64,
    pub store_id: i64,
    pub customer_id: i64,
    pub timestamp: DateTime<Utc>,
    pub product_id: i64,
    pub quantity: i64,
    pub regular_price: f64,
    pub sale_price: f64,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub product_id: i64,
    pub retailer_id: i64,
    pub store_id: i64,
    pub product_name: String,
    pub product_description: String,
    pub category_name: String,
    pub department_name: String,
}

const OBSERVATION_COLUMNS: &str =
    "customer_id, product_id, quantity, regular_price, sale_price";

impl Db {
    /// Stream the whole `orders` table for the batch job.
    pub async fn fetch_observations(&self) -> Result<Vec<OrderRow>> {
        let sql = format!("SELECT {OBSERVATION_COLUMNS} FROM orders");
        let mut rows = sqlx::query_as::<_, OrderRow>(&sql).fetch(&self.pool);

        let mut observations = Vec::new();
        while let Some(row) = rows.try_next().await? {
            observations.push(row);
        }
        debug!("Fetched {} order observations", observations.len());
        Ok(observations)
    }

    /// Fetch observations narrowed to a product, a customer, or both.
    pub async fn fetch_observations_filtered(
        &self,
        product_id: Option<i64>,
        customer_id: Option<i64>,
    ) -> Result<Vec<OrderRow>> {
        let mut sql = format!("SELECT {OBSERVATION_COLUMNS} FROM orders");
        let mut conditions = Vec::new();
        if product_id.is_some() {
            conditions.push("product_id = ?");
        }
        if customer_id.is_some() {
            conditions.push("customer_id = ?");
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        let mut query = sqlx::query_as::<_, OrderRow>(&sql);
        if let Some(pid) = product_id {
            query = query.bind(pid);
        }
        if let Some(cid) = customer_id {
            query = query.bind(cid);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Replace the demo catalog: clears `products` and `orders`, then
    /// inserts the given rows in one transaction.
    pub async fn replace_catalog(
        &self,
        products: &[NewProduct],
        orders: &[NewOrder],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM orders").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM products").execute(&mut *tx).await?;

        for product in products {
            sqlx::query(
                r#"
                INSERT INTO products
                    (product_id, retailer_id, store_id, product_name,
                     product_description, category_name, department_name)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(product.product_id)
            .bind(product.retailer_id)
            .bind(product.store_id)
            .bind(&product.product_name)
            .bind(&product.product_description)
            .bind(&product.category_name)
            .bind(&product.department_name)
            .execute(&mut *tx)
            .await?;
        }

        for order in orders {
            sqlx::query(
                r#"
                INSERT INTO orders
                    (retailer_id, store_id, customer_id, timestamp,
                     product_id, quantity, regular_price, sale_price)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(order.retailer_id)
            .bind(order.store_id)
            .bind(order.customer_id)
            .bind(order.timestamp)
            .bind(order.product_id)
            .bind(order.quantity)
            .bind(order.regular_price)
            .bind(order.sale_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn count_orders(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn order(customer_id: i64, product_id: i64, quantity: i64, price: f64) -> NewOrder {
        NewOrder {
            retailer_id: 1,
            store_id: 1,
            customer_id,
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            product_id,
            quantity,
            regular_price: price,
            sale_price: price * 0.8,
        }
    }

    #[tokio::test]
    async fn replace_catalog_round_trips() {
        let db = Db::connect_in_memory().await.unwrap();
        let orders = vec![order(1, 10, 3, 19.99), order(2, 10, 1, 24.99)];

        db.replace_catalog(&[], &orders).await.unwrap();
        assert_eq!(db.count_orders().await.unwrap(), 2);

        let rows = db.fetch_observations().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].product_id, 10);
        assert!((rows[0].regular_price - 19.99).abs() < 1e-9);

        // Replacing again overwrites rather than appends.
        db.replace_catalog(&[], &orders[..1]).await.unwrap();
        assert_eq!(db.count_orders().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn filtered_fetch_narrows_by_key() {
        let db = Db::connect_in_memory().await.unwrap();
        let orders = vec![
            order(1, 10, 3, 19.99),
            order(1, 11, 2, 9.99),
            order(2, 10, 5, 21.50),
        ];
        db.replace_catalog(&[], &orders).await.unwrap();

        let by_product = db
            .fetch_observations_filtered(Some(10), None)
            .await
            .unwrap();
        assert_eq!(by_product.len(), 2);

        let by_customer = db
            .fetch_observations_filtered(None, Some(1))
            .await
            .unwrap();
        assert_eq!(by_customer.len(), 2);

        let by_pair = db
            .fetch_observations_filtered(Some(10), Some(2))
            .await
            .unwrap();
        assert_eq!(by_pair.len(), 1);
        assert_eq!(by_pair[0].quantity, 5);
    }

    #[test]
    fn price_point_selects_the_requested_column() {
        let row = OrderRow {
            customer_id: 1,
            product_id: 2,
            quantity: 4,
            regular_price: 100.0,
            sale_price: 80.0,
        };

        assert_eq!(row.price_point(PriceType::Regular).price, 100.0);
        assert_eq!(row.price_point(PriceType::Sale).price, 80.0);
        assert_eq!(row.price_point(PriceType::Sale).quantity, 4.0);
    }
}
