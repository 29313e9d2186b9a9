//! Price elasticity estimation.
//!
//! Elasticity is estimated with a log-log OLS regression,
//! `ln Q = α + β·ln P`, fitted independently per grouping key (product,
//! customer, or customer×product) and per price type (regular or sale).
//! The reported elasticity is always `|β|`.

pub mod batch;
pub mod estimator;
pub mod ols;
pub mod types;

pub use batch::{run as run_batch, BatchReport, GroupSummary};
pub use estimator::{fit_price_elasticity, FitError, MIN_OBSERVATIONS};
pub use types::{ElasticityFit, PricePoint, PriceType};
