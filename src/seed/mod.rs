//! Reproducible demo data generation.
//!
//! Mirrors the shape of real retail order feeds: a small catalog, a small
//! customer base, and a couple of years of orders with price variation so
//! every grouping level has something to regress on. The RNG is seeded, so
//! a given configuration always produces the same dataset.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::config::SeedConfig;
use crate::db::{Db, NewOrder, NewProduct};
use crate::error::Result;

const CATEGORIES: &[&str] = &["Electronics", "Fashion", "Food", "Books", "Toys"];
const DEPARTMENTS: &[&str] = &["Department_A", "Department_B", "Department_C"];
const DESCRIPTION_WORDS: &[&str] = &[
    "durable", "compact", "premium", "classic", "lightweight", "versatile",
    "ergonomic", "refurbished", "seasonal", "bestselling", "imported", "handmade",
];

/// Two years of order history.
const HISTORY_DAYS: i64 = 730;

#[derive(Debug, Clone)]
pub struct SeedData {
    pub products: Vec<NewProduct>,
    pub orders: Vec<NewOrder>,
}

#[derive(Debug, Clone, Copy)]
pub struct SeedReport {
    pub products: usize,
    pub orders: usize,
}

/// Generate catalog and order data ending at `now`.
pub fn generate(config: &SeedConfig, now: DateTime<Utc>) -> SeedData {
    let mut rng = StdRng::seed_from_u64(config.rng_seed);

    let products: Vec<NewProduct> = (1..=config.products as i64)
        .map(|product_id| {
            let words: Vec<&str> = (0..6)
                .map(|_| DESCRIPTION_WORDS[rng.random_range(0..DESCRIPTION_WORDS.len())])
                .collect();
            NewProduct {
                product_id,
                retailer_id: rng.random_range(1..=5),
                store_id: rng.random_range(1..=20),
                product_name: format!("Product_{product_id}"),
                product_description: words.join(" "),
                category_name: CATEGORIES[rng.random_range(0..CATEGORIES.len())].to_string(),
                department_name: DEPARTMENTS[rng.random_range(0..DEPARTMENTS.len())]
                    .to_string(),
            }
        })
        .collect();

    let start = now - Duration::days(HISTORY_DAYS);
    let orders: Vec<NewOrder> = (0..config.orders)
        .map(|_| {
            let regular_price = round_cents(rng.random_range(10.0..500.0));
            // Half the orders carry a discount between 10% and 50%.
            let sale_price = if rng.random_bool(0.5) {
                round_cents(regular_price * rng.random_range(0.5..0.9))
            } else {
                regular_price
            };

            NewOrder {
                retailer_id: rng.random_range(1..=5),
                store_id: rng.random_range(1..=20),
                customer_id: rng.random_range(1..=config.customers as i64),
                timestamp: start + Duration::seconds(rng.random_range(0..HISTORY_DAYS * 86_400)),
                product_id: rng.random_range(1..=config.products as i64),
                quantity: rng.random_range(1..=10),
                regular_price,
                sale_price,
            }
        })
        .collect();

    SeedData { products, orders }
}

/// Generate and persist demo data, replacing any existing catalog.
pub async fn run(db: &Db, config: &SeedConfig) -> Result<SeedReport> {
    let data = generate(config, Utc::now());
    db.replace_catalog(&data.products, &data.orders).await?;

    info!(
        "Seeded {} products and {} orders for {} customers",
        data.products.len(),
        data.orders.len(),
        config.customers
    );

    Ok(SeedReport {
        products: data.products.len(),
        orders: data.orders.len(),
    })
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config() -> SeedConfig {
        SeedConfig {
            orders: 200,
            products: 5,
            customers: 10,
            rng_seed: 42,
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn generation_is_reproducible() {
        let a = generate(&config(), fixed_now());
        let b = generate(&config(), fixed_now());

        assert_eq!(a.orders.len(), b.orders.len());
        for (x, y) in a.orders.iter().zip(b.orders.iter()) {
            assert_eq!(x.product_id, y.product_id);
            assert_eq!(x.customer_id, y.customer_id);
            assert_eq!(x.quantity, y.quantity);
            assert_eq!(x.regular_price, y.regular_price);
            assert_eq!(x.sale_price, y.sale_price);
            assert_eq!(x.timestamp, y.timestamp);
        }
    }

    #[test]
    fn different_seeds_differ() {
        let a = generate(&config(), fixed_now());
        let mut other = config();
        other.rng_seed = 43;
        let b = generate(&other, fixed_now());

        assert!(a
            .orders
            .iter()
            .zip(b.orders.iter())
            .any(|(x, y)| x.regular_price != y.regular_price));
    }

    #[test]
    fn generated_rows_are_in_range() {
        let data = generate(&config(), fixed_now());

        assert_eq!(data.products.len(), 5);
        assert_eq!(data.orders.len(), 200);

        let start = fixed_now() - Duration::days(HISTORY_DAYS);
        for order in &data.orders {
            assert!((1..=5).contains(&order.product_id));
            assert!((1..=10).contains(&order.customer_id));
            assert!((1..=10).contains(&order.quantity));
            assert!(order.regular_price >= 10.0 && order.regular_price <= 500.0);
            assert!(order.sale_price <= order.regular_price);
            assert!(order.sale_price >= order.regular_price * 0.5 - 0.01);
            assert!(order.timestamp >= start && order.timestamp < fixed_now());
        }
    }

    #[test]
    fn some_orders_are_discounted() {
        let data = generate(&config(), fixed_now());
        let discounted = data
            .orders
            .iter()
            .filter(|o| o.sale_price < o.regular_price)
            .count();
        assert!(discounted > 0);
        assert!(discounted < data.orders.len());
    }

    #[tokio::test]
    async fn run_persists_the_catalog() {
        let db = Db::connect_in_memory().await.unwrap();
        let report = run(&db, &config()).await.unwrap();

        assert_eq!(report.orders, 200);
        assert_eq!(db.count_orders().await.unwrap(), 200);
    }
}
