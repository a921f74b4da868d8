//! Which market's volatility is bought and which is sold.

use serde::{Deserialize, Serialize};

use crate::hedging::ReplicationOutcome;

/// Direction of a triggered window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDirection {
    /// Offshore realized vol is richer: buy onshore, sell offshore.
    BuyOnshoreSellOffshore,
    /// Onshore realized vol is richer: buy offshore, sell onshore.
    BuyOffshoreSellOnshore,
}

impl TradeDirection {
    /// Compare pre-window vols against a significance threshold.
    ///
    /// Returns `None` when `|offshore - onshore|` does not exceed the
    /// threshold, or either vol is NaN.
    pub fn decide(vol_onshore: f64, vol_offshore: f64, vol_diff_significance: f64) -> Option<Self> {
        let diff = vol_offshore - vol_onshore;
        if diff > vol_diff_significance {
            Some(Self::BuyOnshoreSellOffshore)
        } else if diff < -vol_diff_significance {
            Some(Self::BuyOffshoreSellOnshore)
        } else {
            None
        }
    }

    pub fn buys_onshore(&self) -> bool {
        matches!(self, Self::BuyOnshoreSellOffshore)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BuyOnshoreSellOffshore => "buy_onshore_sell_offshore",
            Self::BuyOffshoreSellOnshore => "buy_offshore_sell_onshore",
        }
    }

    /// Sold-side cost less bought-side cost less both sides' transaction
    /// costs.
    pub fn pnl(&self, onshore: &ReplicationOutcome, offshore: &ReplicationOutcome) -> f64 {
        let transaction_costs = onshore.transaction_cost() + offshore.transaction_cost();
        let spread = match self {
            Self::BuyOnshoreSellOffshore => offshore.cost() - onshore.cost(),
            Self::BuyOffshoreSellOnshore => onshore.cost() - offshore.cost(),
        };
        spread - transaction_costs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_symmetry() {
        assert_eq!(
            TradeDirection::decide(0.10, 0.15, 0.02),
            Some(TradeDirection::BuyOnshoreSellOffshore)
        );
        assert_eq!(
            TradeDirection::decide(0.15, 0.10, 0.02),
            Some(TradeDirection::BuyOffshoreSellOnshore)
        );
        assert_eq!(TradeDirection::decide(0.10, 0.105, 0.02), None);
        assert!(TradeDirection::decide(0.10, 0.15, 0.02).unwrap().buys_onshore());
    }

    #[test]
    fn test_threshold_boundary_and_nan() {
        // Exactly at the threshold is not significant.
        assert_eq!(TradeDirection::decide(0.25, 0.375, 0.125), None);
        assert_eq!(TradeDirection::decide(f64::NAN, 0.15, 0.02), None);
        // Zero threshold trades on any difference.
        assert!(TradeDirection::decide(0.10, 0.1001, 0.0).is_some());
        assert_eq!(TradeDirection::decide(0.10, 0.10, 0.0), None);
    }

    #[test]
    fn test_pnl_sells_the_richer_side() {
        let onshore = ReplicationOutcome {
            cash_flows_sum: 1_000.0,
            rf_paid: 0.0,
            spread_paid: 100.0,
            ..Default::default()
        };
        let offshore = ReplicationOutcome {
            cash_flows_sum: 3_000.0,
            rf_paid: 50.0,
            spread_paid: 150.0,
            ..Default::default()
        };

        let buy_onshore = TradeDirection::BuyOnshoreSellOffshore.pnl(&onshore, &offshore);
        assert_eq!(buy_onshore, 3_050.0 - 1_000.0 - 250.0);

        let buy_offshore = TradeDirection::BuyOffshoreSellOnshore.pnl(&onshore, &offshore);
        assert_eq!(buy_offshore, 1_000.0 - 3_050.0 - 250.0);
    }
}
