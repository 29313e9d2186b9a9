//! Elasticity estimation over raw order observations.
//!
//! Cleans the observations (log of a non-positive value is undefined),
//! fits the log-log regression, and reports the elasticity as `|β|`.

use ndarray::Array1;
use thiserror::Error;

use super::ols;
use super::types::{ElasticityFit, PricePoint};

/// Observations required for an identifiable regression.
pub const MIN_OBSERVATIONS: usize = 2;

/// Reasons a group cannot be fitted. Groups failing this way are skipped
/// by the batch job and surface as client errors in the API.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitError {
    #[error("not enough valid observations for a regression (need {needed}, got {got})")]
    NotEnoughData { needed: usize, got: usize },

    #[error("price is constant within the group; the slope is undefined")]
    ConstantPrice,
}

/// Fit `ln Q = α + β·ln P` over the given observations.
///
/// Rows with non-positive quantity or price are dropped before the log
/// transform. The returned elasticity is `|β|`, never the signed slope.
pub fn fit_price_elasticity(points: &[PricePoint]) -> Result<ElasticityFit, FitError> {
    let valid: Vec<PricePoint> = points
        .iter()
        .copied()
        .filter(|p| p.quantity > 0.0 && p.price > 0.0)
        .collect();

    if valid.len() < MIN_OBSERVATIONS {
        return Err(FitError::NotEnoughData {
            needed: MIN_OBSERVATIONS,
            got: valid.len(),
        });
    }

    let log_price = Array1::from_iter(valid.iter().map(|p| p.price.ln()));
    let log_quantity = Array1::from_iter(valid.iter().map(|p| p.quantity.ln()));

    let line = ols::fit_line(&log_price, &log_quantity)?;

    Ok(ElasticityFit {
        intercept: line.intercept,
        slope: line.slope,
        elasticity: line.slope.abs(),
        r_squared: line.r_squared,
        observations: valid.len(),
    })
}
