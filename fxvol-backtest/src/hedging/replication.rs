//! Shared replication inputs, outputs and the strategy trait.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{PricePoint, ReturnSeries};
use crate::pricing::PricingError;
use crate::volatility::{RealizedVolEstimator, VolatilitySignal};

/// Seconds in one 252-day trading year, used to turn calendar time to
/// expiry into an option term.
pub const SECONDS_PER_TERM_YEAR: f64 = 252.0 * 24.0 * 60.0 * 60.0;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Path too short: need at least 2 points, got {0}")]
    PathTooShort(usize),

    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),
}

/// Where the hedge gets its volatility from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VolatilityInput {
    /// One value for the whole window.
    Fixed(VolatilitySignal),
    /// Realized vol over a trailing window of the option's length, ending at
    /// each path point.
    Rolling,
}

/// Static economics of one replication.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HedgeParameters {
    pub notional: f64,
    /// Spread as a fraction of notional traded.
    pub spread: f64,
    /// Second currency rate minus base currency rate.
    pub rate_differential: f64,
    pub delta_seconds: i64,
}

impl HedgeParameters {
    /// Funding charged per calendar day on a unit hedge ratio.
    pub fn daily_funding(&self) -> f64 {
        self.notional * self.rate_differential / 365.0
    }
}

/// One option replication over a price path.
#[derive(Debug, Clone)]
pub struct ReplicationRequest<'a> {
    /// Prices in `[start, end]`, ascending.
    pub path: &'a [PricePoint],
    /// Returns of the same source, used for rolling vols.
    pub returns: &'a ReturnSeries,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub volatility: VolatilityInput,
    pub params: HedgeParameters,
}

impl<'a> ReplicationRequest<'a> {
    /// Fail unless the path has a starting point and an unwind point.
    pub fn checked_path(&self) -> Result<(&'a PricePoint, &'a PricePoint), SimulationError> {
        match (self.path.first(), self.path.last()) {
            (Some(first), Some(last)) if self.path.len() >= 2 => Ok((first, last)),
            _ => Err(SimulationError::PathTooShort(self.path.len())),
        }
    }

    /// Volatility signal in force at `t`.
    pub fn volatility_at(&self, t: NaiveDateTime) -> VolatilitySignal {
        match self.volatility {
            VolatilityInput::Fixed(signal) => signal
                .value()
                .map_or(VolatilitySignal::Unavailable, VolatilitySignal::from_value),
            VolatilityInput::Rolling => {
                let lookback = self.end - self.start;
                RealizedVolEstimator::new(self.params.delta_seconds).estimate_window(
                    self.returns,
                    t - lookback,
                    t,
                )
            }
        }
    }

    /// Time to expiry at `t` as a fraction of a 252-day year.
    pub fn term_at(&self, t: NaiveDateTime) -> f64 {
        (self.end - t).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_TERM_YEAR
    }
}

/// Result of one replication.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplicationOutcome {
    /// Spot cash flows including the final unwind.
    pub cash_flows_sum: f64,
    pub rf_paid: f64,
    pub spread_paid: f64,
    /// Executed hedge trades, excluding the unwind.
    pub hedge_points: usize,
    /// Option premium at every priced point.
    pub premium_path: Vec<f64>,
    /// Theoretical payoff less the inception premium, in notional terms.
    pub payoff_comparison: f64,
}

impl ReplicationOutcome {
    /// Replication cost: spot cash flows plus funding.
    pub fn cost(&self) -> f64 {
        self.cash_flows_sum + self.rf_paid
    }

    pub fn transaction_cost(&self) -> f64 {
        self.spread_paid
    }

    /// Cost net of transaction cost.
    pub fn net(&self) -> f64 {
        self.cost() - self.transaction_cost()
    }
}

/// `notional * (max(last - strike, 0) / strike - premium_fraction)`.
pub fn payoff_comparison(notional: f64, strike: f64, last_spot: f64, premium_fraction: f64) -> f64 {
    notional * ((last_spot - strike).max(0.0) / strike - premium_fraction)
}

/// A way of replicating the option on one price path.
pub trait HedgingStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn replicate(&self, request: &ReplicationRequest<'_>) -> Result<ReplicationOutcome, SimulationError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 6, 1).unwrap().and_hms_opt(10, 0, 0).unwrap()
    }

    fn params() -> HedgeParameters {
        HedgeParameters {
            notional: 1_000_000.0,
            spread: 0.002,
            rate_differential: 0.021,
            delta_seconds: 3600,
        }
    }

    #[test]
    fn test_path_too_short() {
        let returns = ReturnSeries::default();
        let path = vec![PricePoint::new(start(), 75.0)];
        let request = ReplicationRequest {
            path: &path,
            returns: &returns,
            start: start(),
            end: start() + Duration::days(5),
            volatility: VolatilityInput::Fixed(VolatilitySignal::Available(0.1)),
            params: params(),
        };
        assert!(matches!(request.checked_path(), Err(SimulationError::PathTooShort(1))));
    }

    #[test]
    fn test_term_in_trading_years() {
        let returns = ReturnSeries::default();
        let request = ReplicationRequest {
            path: &[],
            returns: &returns,
            start: start(),
            end: start() + Duration::days(5),
            volatility: VolatilityInput::Rolling,
            params: params(),
        };
        assert_relative_eq!(request.term_at(start()), 5.0 / 252.0, epsilon = 1e-12);
        assert_relative_eq!(request.term_at(start() + Duration::hours(12)), 4.5 / 252.0, epsilon = 1e-12);
        assert_eq!(request.term_at(start() + Duration::days(5)), 0.0);
        // No returns at all: nothing to estimate from.
        assert_eq!(request.volatility_at(start()), VolatilitySignal::Unavailable);
    }

    #[test]
    fn test_outcome_cost_split() {
        let outcome = ReplicationOutcome {
            cash_flows_sum: 1200.0,
            rf_paid: 50.0,
            spread_paid: 300.0,
            ..Default::default()
        };
        assert_eq!(outcome.cost(), 1250.0);
        assert_eq!(outcome.transaction_cost(), 300.0);
        assert_eq!(outcome.net(), 950.0);
        assert_relative_eq!(params().daily_funding(), 1_000_000.0 * 0.021 / 365.0);
    }

    #[test]
    fn test_payoff_comparison() {
        assert_relative_eq!(payoff_comparison(1e6, 75.0, 78.0, 0.01), 1e6 * (3.0 / 75.0 - 0.01));
        assert_relative_eq!(payoff_comparison(1e6, 75.0, 70.0, 0.01), -1e4);
    }
}
