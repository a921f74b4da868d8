//! Bid/offer spread model for spot hedge trades.
//!
//! Spreads are decimal fractions of the notional traded. By default both
//! sides are charged the onshore spread; `side_specific` switches the offshore
//! replication to its own quote.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::data::MarketSide;

/// Configurable spread model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadModel {
    /// Onshore spread as a fraction of notional traded.
    pub onshore: Decimal,
    /// Offshore spread as a fraction of notional traded.
    pub offshore: Decimal,
    /// Charge each side its own spread instead of the onshore one.
    #[serde(default)]
    pub side_specific: bool,
}

impl Default for SpreadModel {
    fn default() -> Self {
        Self {
            onshore: Decimal::new(2, 3),     // 20 bp
            offshore: Decimal::new(5, 4),    // 5 bp
            side_specific: false,
        }
    }
}

impl SpreadModel {
    /// Create a model charging `spread` on both sides.
    pub fn new(spread: Decimal) -> Self {
        Self {
            onshore: spread,
            offshore: spread,
            side_specific: false,
        }
    }

    /// Create a zero-spread model.
    pub fn zero() -> Self {
        Self::new(Decimal::ZERO)
    }

    pub fn side_specific(mut self, enabled: bool) -> Self {
        self.side_specific = enabled;
        self
    }

    /// Spread charged when replicating on `side`.
    pub fn for_side(&self, side: MarketSide) -> Decimal {
        match side {
            MarketSide::Offshore if self.side_specific => self.offshore,
            _ => self.onshore,
        }
    }

    /// Spread for `side` as a float for the simulation loop. `None` when the
    /// quote has no finite, non-negative float value.
    pub fn rate_for(&self, side: MarketSide) -> Option<f64> {
        self.for_side(side)
            .to_f64()
            .filter(|rate| rate.is_finite() && *rate >= 0.0)
    }

    /// Cost of trading `notional_traded` units on `side`.
    pub fn charge(&self, notional_traded: f64, side: MarketSide) -> Option<f64> {
        self.rate_for(side).map(|rate| (notional_traded * rate).abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_spread() {
        let model = SpreadModel::default();
        assert_eq!(model.onshore, dec!(0.002));
        assert_eq!(model.offshore, dec!(0.0005));
        assert!(!model.side_specific);
    }

    #[test]
    fn test_onshore_spread_charged_on_both_sides_by_default() {
        let model = SpreadModel::default();
        assert_eq!(model.for_side(MarketSide::Onshore), dec!(0.002));
        assert_eq!(model.for_side(MarketSide::Offshore), dec!(0.002));

        let specific = model.side_specific(true);
        assert_eq!(specific.for_side(MarketSide::Offshore), dec!(0.0005));
        assert_eq!(specific.for_side(MarketSide::Onshore), dec!(0.002));
    }

    #[test]
    fn test_charge_is_absolute() {
        let model = SpreadModel::new(dec!(0.001));
        assert!((model.charge(-500_000.0, MarketSide::Onshore).unwrap() - 500.0).abs() < 1e-9);
        assert!((model.charge(500_000.0, MarketSide::Offshore).unwrap() - 500.0).abs() < 1e-9);
        assert_eq!(SpreadModel::zero().charge(1e6, MarketSide::Onshore), Some(0.0));
    }

    #[test]
    fn test_negative_spread_has_no_rate() {
        let model = SpreadModel::new(dec!(-0.001));
        assert_eq!(model.rate_for(MarketSide::Onshore), None);
        assert_eq!(model.charge(1e6, MarketSide::Onshore), None);

        let specific = SpreadModel {
            offshore: dec!(-0.001),
            ..SpreadModel::default()
        }
        .side_specific(true);
        assert!(specific.rate_for(MarketSide::Onshore).is_some());
        assert_eq!(specific.rate_for(MarketSide::Offshore), None);
    }
}
