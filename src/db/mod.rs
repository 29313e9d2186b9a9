//! SQLite access layer.
//!
//! One `Db` handle wraps the pool and owns schema bootstrap. Order scans,
//! elasticity persistence, and the read-only query runner used by the
//! agent pipeline live in the submodules.

pub mod elasticities;
pub mod orders;
pub mod query;

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::error::Result;

pub use elasticities::{
    ComputedElasticities, CustomerElasticity, PairElasticity, ProductElasticity,
};
pub use orders::{NewOrder, NewProduct, OrderRow};
pub use query::{QueryOutput, MAX_RENDERED_ROWS};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        order_id INTEGER PRIMARY KEY AUTOINCREMENT,
        retailer_id INTEGER NOT NULL,
        store_id INTEGER NOT NULL,
        customer_id INTEGER NOT NULL,
        timestamp TEXT NOT NULL,
        product_id INTEGER NOT NULL,
        quantity INTEGER NOT NULL,
        regular_price REAL NOT NULL,
        sale_price REAL NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        product_id INTEGER PRIMARY KEY,
        retailer_id INTEGER NOT NULL,
        store_id INTEGER NOT NULL,
        product_name TEXT NOT NULL,
        product_description TEXT NOT NULL,
        category_name TEXT NOT NULL,
        department_name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS computed_product_elasticities (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        product_id INTEGER NOT NULL,
        price_type TEXT NOT NULL,
        intercept REAL NOT NULL,
        elasticity REAL NOT NULL,
        r_squared REAL NOT NULL,
        observations INTEGER NOT NULL,
        computed_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS computed_customer_elasticities (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_id INTEGER NOT NULL,
        price_type TEXT NOT NULL,
        intercept REAL NOT NULL,
        elasticity REAL NOT NULL,
        r_squared REAL NOT NULL,
        observations INTEGER NOT NULL,
        computed_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS computed_c_p_elasticities (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_id INTEGER NOT NULL,
        product_id INTEGER NOT NULL,
        price_type TEXT NOT NULL,
        intercept REAL NOT NULL,
        elasticity REAL NOT NULL,
        r_squared REAL NOT NULL,
        observations INTEGER NOT NULL,
        computed_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_orders_product ON orders(product_id)",
    "CREATE INDEX IF NOT EXISTS idx_orders_customer ON orders(customer_id)",
];

/// Shared database handle. Cheap to clone; the pool is reference-counted.
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Open (or create) the database at `path` and bootstrap the schema.
    pub async fn connect(path: &Path) -> Result<Self> {
        info!("Opening database at {}", path.display());

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    /// In-memory database for tests. A single connection with no idle
    /// timeout, so the database outlives pool checkouts.
    pub async fn connect_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(SqliteConnectOptions::new().in_memory(true))
            .await?;

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}
