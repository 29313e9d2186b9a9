//! Shared types for elasticity estimation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which price column an elasticity was estimated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceType {
    #[default]
    Regular,
    Sale,
}

impl PriceType {
    /// Both price types, in the order the batch job processes them.
    pub const ALL: [PriceType; 2] = [PriceType::Regular, PriceType::Sale];

    /// The `orders` column holding this price.
    pub fn column(&self) -> &'static str {
        match self {
            PriceType::Regular => "regular_price",
            PriceType::Sale => "sale_price",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceType::Regular => "regular",
            PriceType::Sale => "sale",
        }
    }
}

impl fmt::Display for PriceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "regular" => Ok(PriceType::Regular),
            "sale" => Ok(PriceType::Sale),
            other => Err(format!(
                "invalid price type '{other}' (expected 'regular' or 'sale')"
            )),
        }
    }
}

/// One (price, quantity) observation fed into the regression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub price: f64,
    pub quantity: f64,
}

/// A fitted log-log regression for one group and price type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElasticityFit {
    /// Regression intercept α.
    pub intercept: f64,
    /// Signed regression slope β.
    pub slope: f64,
    /// Reported elasticity, `|β|`.
    pub elasticity: f64,
    pub r_squared: f64,
    /// Valid observations that entered the fit.
    pub observations: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_type_round_trips_through_strings() {
        assert_eq!("regular".parse::<PriceType>().unwrap(), PriceType::Regular);
        assert_eq!("SALE".parse::<PriceType>().unwrap(), PriceType::Sale);
        assert_eq!(PriceType::Regular.to_string(), "regular");
        assert_eq!(PriceType::Sale.column(), "sale_price");
    }

    #[test]
    fn unknown_price_type_is_rejected() {
        assert!("wholesale".parse::<PriceType>().is_err());
    }
}
