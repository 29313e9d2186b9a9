//! Single-regressor ordinary least squares.
//!
//! The elasticity model only ever has one regressor (log price), so the
//! normal equations collapse to the centered closed form instead of a full
//! design-matrix solve.

use ndarray::Array1;

use super::estimator::FitError;

/// Minimum spread in the regressor before the slope is considered defined.
const VARIANCE_FLOOR: f64 = 1e-12;

/// A fitted line `y = intercept + slope·x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OlsLine {
    pub intercept: f64,
    pub slope: f64,
    pub r_squared: f64,
}

/// Fit `y = a + b·x` by least squares.
///
/// `x` and `y` must be the same length. Fails when fewer than two points
/// are given or when `x` carries no variance.
pub fn fit_line(x: &Array1<f64>, y: &Array1<f64>) -> Result<OlsLine, FitError> {
    let n = x.len();
    debug_assert_eq!(n, y.len());
    if n < 2 {
        return Err(FitError::NotEnoughData { needed: 2, got: n });
    }

    let x_mean = x.sum() / n as f64;
    let y_mean = y.sum() / n as f64;
    let x_c = x.mapv(|v| v - x_mean);
    let y_c = y.mapv(|v| v - y_mean);

    let s_xx = x_c.dot(&x_c);
    if s_xx < VARIANCE_FLOOR {
        return Err(FitError::ConstantPrice);
    }

    let slope = x_c.dot(&y_c) / s_xx;
    let intercept = y_mean - slope * x_mean;

    let residuals = &y_c - &(&x_c * slope);
    let ss_res = residuals.dot(&residuals);
    let ss_tot = y_c.dot(&y_c);
    let r_squared = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else {
        // y is constant; a zero-slope line explains it exactly
        1.0
    };

    Ok(OlsLine {
        intercept,
        slope,
        r_squared,
    })
}
