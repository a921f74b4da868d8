//! Shared pricing types.

use serde::{Deserialize, Serialize};

/// Option type (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Call,
    Put,
}

impl OptionKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "C" | "CALL" => Some(Self::Call),
            "P" | "PUT" => Some(Self::Put),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "C",
            Self::Put => "P",
        }
    }
}

/// Snapshot of an instrument's sensitivities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
    pub rho: f64,
}

/// Inputs of a single European option.
///
/// Term is a fraction of a 252-day year. The rate is the differential
/// `second_ccy - base_ccy` and may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionParams {
    pub term: f64,
    pub volatility: f64,
    pub spot: f64,
    pub initial_spot: f64,
    pub rate: f64,
    pub strike: f64,
}

impl OptionParams {
    /// Strike at `strike_decimal` times the initial fixing.
    pub fn struck_at(
        term: f64,
        volatility: f64,
        spot: f64,
        initial_spot: f64,
        rate: f64,
        strike_decimal: f64,
    ) -> Self {
        Self {
            term,
            volatility,
            spot,
            initial_spot,
            rate,
            strike: initial_spot * strike_decimal,
        }
    }

    /// Strike at 100% of the initial fixing.
    pub fn at_the_money(term: f64, volatility: f64, spot: f64, initial_spot: f64, rate: f64) -> Self {
        Self::struck_at(term, volatility, spot, initial_spot, rate, 1.0)
    }

    pub fn with_volatility(self, volatility: f64) -> Self {
        Self { volatility, ..self }
    }

    pub fn with_strike(self, strike: f64) -> Self {
        Self { strike, ..self }
    }

    pub fn with_spot(self, spot: f64) -> Self {
        Self { spot, ..self }
    }
}

/// Premium, sensitivities and payoff of an instrument.
pub trait Pricing {
    /// Premium in currency units of spot.
    fn price(&self) -> f64;
    fn delta(&self) -> f64;
    fn gamma(&self) -> f64;
    fn vega(&self) -> f64;
    fn theta(&self) -> f64;
    fn rho(&self) -> f64;
    /// Intrinsic payoff at the current spot.
    fn execute(&self) -> f64;

    fn greeks(&self) -> Greeks {
        Greeks {
            delta: self.delta(),
            gamma: self.gamma(),
            theta: self.theta(),
            vega: self.vega(),
            rho: self.rho(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_kind_parsing() {
        assert_eq!(OptionKind::from_str("C"), Some(OptionKind::Call));
        assert_eq!(OptionKind::from_str("put"), Some(OptionKind::Put));
        assert_eq!(OptionKind::from_str("X"), None);
    }

    #[test]
    fn test_at_the_money_strike() {
        let params = OptionParams::at_the_money(0.1, 0.2, 101.0, 100.0, 0.02);
        assert_eq!(params.strike, 100.0);
        let otm = OptionParams::struck_at(0.1, 0.2, 101.0, 100.0, 0.02, 1.1);
        assert!((otm.strike - 110.0).abs() < 1e-12);
    }
}
