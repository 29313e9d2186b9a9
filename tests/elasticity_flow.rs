//! End-to-end flow: seed a scratch database, run the batch job, and check
//! the persisted results against the estimator's guarantees.

use pricelens::config::SeedConfig;
use pricelens::db::Db;
use pricelens::elasticity;
use tempfile::TempDir;

fn small_seed() -> SeedConfig {
    SeedConfig {
        orders: 300,
        products: 4,
        customers: 6,
        rng_seed: 7,
    }
}

#[tokio::test]
async fn seed_compute_and_read_back() {
    let dir = TempDir::new().unwrap();
    let db = Db::connect(&dir.path().join("flow.db")).await.unwrap();

    let seeded = pricelens::seed::run(&db, &small_seed()).await.unwrap();
    assert_eq!(seeded.orders, 300);

    let report = elasticity::run_batch(&db, false).await.unwrap();
    assert_eq!(report.orders, 300);
    // With 300 orders over 4 products and price variation everywhere, the
    // product level must fit both price types for every product.
    assert_eq!(report.products.fitted, 8);
    assert_eq!(report.products.skipped, 0);

    let products = db.product_elasticities().await.unwrap();
    assert_eq!(products.len(), 8);
    for row in &products {
        assert!(row.elasticity >= 0.0, "elasticity must be a magnitude");
        assert!(row.elasticity.is_finite());
        assert!(row.observations >= 2);
        assert!(row.price_type == "regular" || row.price_type == "sale");
    }

    let customers = db.customer_elasticities().await.unwrap();
    assert_eq!(customers.len(), report.customers.fitted);

    let pairs = db.pair_elasticities().await.unwrap();
    assert_eq!(pairs.len(), report.pairs.fitted);
}

#[tokio::test]
async fn recomputation_reproduces_identical_rows() {
    let dir = TempDir::new().unwrap();
    let db = Db::connect(&dir.path().join("repeat.db")).await.unwrap();
    pricelens::seed::run(&db, &small_seed()).await.unwrap();

    elasticity::run_batch(&db, false).await.unwrap();
    let first: Vec<_> = db
        .pair_elasticities()
        .await
        .unwrap()
        .into_iter()
        .map(|r| (r.customer_id, r.product_id, r.price_type, r.intercept, r.elasticity))
        .collect();

    elasticity::run_batch(&db, false).await.unwrap();
    let second: Vec<_> = db
        .pair_elasticities()
        .await
        .unwrap()
        .into_iter()
        .map(|r| (r.customer_id, r.product_id, r.price_type, r.intercept, r.elasticity))
        .collect();

    assert_eq!(first, second);
}

#[tokio::test]
async fn reseeding_with_same_seed_gives_same_elasticities() {
    let dir = TempDir::new().unwrap();

    let db_a = Db::connect(&dir.path().join("a.db")).await.unwrap();
    pricelens::seed::run(&db_a, &small_seed()).await.unwrap();
    elasticity::run_batch(&db_a, false).await.unwrap();

    let db_b = Db::connect(&dir.path().join("b.db")).await.unwrap();
    pricelens::seed::run(&db_b, &small_seed()).await.unwrap();
    elasticity::run_batch(&db_b, false).await.unwrap();

    let a = db_a.product_elasticities().await.unwrap();
    let b = db_b.product_elasticities().await.unwrap();
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b.iter()) {
        assert_eq!(x.product_id, y.product_id);
        assert_eq!(x.price_type, y.price_type);
        assert_eq!(x.elasticity, y.elasticity);
    }
}
