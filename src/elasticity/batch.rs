//! Batch elasticity computation.
//!
//! Reads the whole `orders` table, fits the estimator per product, per
//! customer, and per (customer, product) pair for both price types, and
//! replaces the three result tables in one transaction. Group iteration is
//! over sorted keys, so recomputation over identical input produces the
//! same rows in the same order.

use std::collections::BTreeMap;

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use super::estimator::{fit_price_elasticity, FitError};
use super::types::{ElasticityFit, PricePoint, PriceType};
use crate::db::{
    ComputedElasticities, CustomerElasticity, Db, OrderRow, PairElasticity, ProductElasticity,
};
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupSummary {
    /// (group, price type) combinations that produced a stored row.
    pub fitted: usize,
    /// Combinations skipped for lack of data or price variation.
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub orders: usize,
    pub products: GroupSummary,
    pub customers: GroupSummary,
    pub pairs: GroupSummary,
}

/// Run the full batch job against `db`.
pub async fn run(db: &Db, show_progress: bool) -> Result<BatchReport> {
    let orders = db.fetch_observations().await?;
    info!("Computing elasticities over {} orders", orders.len());

    let by_product = group_by(&orders, |o| o.product_id);
    let by_customer = group_by(&orders, |o| o.customer_id);
    let by_pair = group_by(&orders, |o| (o.customer_id, o.product_id));

    let progress = make_progress(
        (by_product.len() + by_customer.len() + by_pair.len()) as u64,
        show_progress,
    );

    let mut results = ComputedElasticities::default();
    let mut report = BatchReport {
        orders: orders.len(),
        ..Default::default()
    };

    progress.set_message("products");
    for (&product_id, rows) in &by_product {
        for price_type in PriceType::ALL {
            match fit_group(rows, price_type) {
                Ok(fit) => {
                    results.products.push(ProductElasticity {
                        product_id,
                        price_type,
                        fit,
                    });
                    report.products.fitted += 1;
                }
                Err(reason) => {
                    debug!("Skipping product {product_id} ({price_type}): {reason}");
                    report.products.skipped += 1;
                }
            }
        }
        progress.inc(1);
    }

    progress.set_message("customers");
    for (&customer_id, rows) in &by_customer {
        for price_type in PriceType::ALL {
            match fit_group(rows, price_type) {
                Ok(fit) => {
                    results.customers.push(CustomerElasticity {
                        customer_id,
                        price_type,
                        fit,
                    });
                    report.customers.fitted += 1;
                }
                Err(reason) => {
                    debug!("Skipping customer {customer_id} ({price_type}): {reason}");
                    report.customers.skipped += 1;
                }
            }
        }
        progress.inc(1);
    }

    progress.set_message("customer-product pairs");
    for (&(customer_id, product_id), rows) in &by_pair {
        for price_type in PriceType::ALL {
            match fit_group(rows, price_type) {
                Ok(fit) => {
                    results.pairs.push(PairElasticity {
                        customer_id,
                        product_id,
                        price_type,
                        fit,
                    });
                    report.pairs.fitted += 1;
                }
                Err(reason) => {
                    debug!(
                        "Skipping pair ({customer_id}, {product_id}) ({price_type}): {reason}"
                    );
                    report.pairs.skipped += 1;
                }
            }
        }
        progress.inc(1);
    }

    db.store_elasticities(&results, Utc::now()).await?;
    progress.finish_and_clear();

    info!(
        "Stored elasticities: {} product, {} customer, {} pair rows ({} combinations skipped)",
        report.products.fitted,
        report.customers.fitted,
        report.pairs.fitted,
        report.products.skipped + report.customers.skipped + report.pairs.skipped,
    );

    Ok(report)
}

fn fit_group(
    rows: &[&OrderRow],
    price_type: PriceType,
) -> std::result::Result<ElasticityFit, FitError> {
    let points: Vec<PricePoint> = rows.iter().map(|r| r.price_point(price_type)).collect();
    fit_price_elasticity(&points)
}

fn group_by<K: Ord + Copy>(
    orders: &[OrderRow],
    key: impl Fn(&OrderRow) -> K,
) -> BTreeMap<K, Vec<&OrderRow>> {
    let mut groups: BTreeMap<K, Vec<&OrderRow>> = BTreeMap::new();
    for order in orders {
        groups.entry(key(order)).or_default().push(order);
    }
    groups
}

fn make_progress(total: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap(),
    );
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewOrder;
    use chrono::{TimeZone, Utc};

    fn order(
        customer_id: i64,
        product_id: i64,
        quantity: i64,
        regular_price: f64,
        sale_price: f64,
    ) -> NewOrder {
        NewOrder {
            retailer_id: 1,
            store_id: 1,
            customer_id,
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
            product_id,
            quantity,
            regular_price,
            sale_price,
        }
    }

    async fn seeded_db() -> Db {
        let db = Db::connect_in_memory().await.unwrap();
        let orders = vec![
            // Product 1, customer 1: price varies for both price types.
            order(1, 1, 10, 10.0, 8.0),
            order(1, 1, 6, 20.0, 15.0),
            order(1, 1, 4, 30.0, 22.0),
            // Product 2, customer 2: constant prices, never fittable.
            order(2, 2, 5, 25.0, 25.0),
            order(2, 2, 7, 25.0, 25.0),
            // Product 3, customer 3: single order, not enough data.
            order(3, 3, 2, 40.0, 35.0),
        ];
        db.replace_catalog(&[], &orders).await.unwrap();
        db
    }

    #[tokio::test]
    async fn batch_fits_and_skips_per_group() {
        let db = seeded_db().await;
        let report = run(&db, false).await.unwrap();

        assert_eq!(report.orders, 6);
        // Product 1 fits both price types; products 2 and 3 skip both.
        assert_eq!(report.products, GroupSummary { fitted: 2, skipped: 4 });
        assert_eq!(report.customers, GroupSummary { fitted: 2, skipped: 4 });
        assert_eq!(report.pairs, GroupSummary { fitted: 2, skipped: 4 });

        let products = db.product_elasticities().await.unwrap();
        assert_eq!(products.len(), 2);
        for row in &products {
            assert_eq!(row.product_id, Some(1));
            assert!(row.elasticity >= 0.0);
            assert!(row.elasticity.is_finite());
            assert_eq!(row.observations, 3);
        }
    }

    #[tokio::test]
    async fn recomputation_is_deterministic() {
        let db = seeded_db().await;

        run(&db, false).await.unwrap();
        let first = db.product_elasticities().await.unwrap();

        run(&db, false).await.unwrap();
        let second = db.product_elasticities().await.unwrap();

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.product_id, b.product_id);
            assert_eq!(a.price_type, b.price_type);
            assert_eq!(a.intercept, b.intercept);
            assert_eq!(a.elasticity, b.elasticity);
        }
    }

    #[tokio::test]
    async fn empty_orders_table_yields_empty_results() {
        let db = Db::connect_in_memory().await.unwrap();
        let report = run(&db, false).await.unwrap();

        assert_eq!(report.orders, 0);
        assert_eq!(report.products, GroupSummary::default());
        assert!(db.product_elasticities().await.unwrap().is_empty());
    }
}
