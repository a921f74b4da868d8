//! Stop-loss style replication: hold a full unit hedge while spot is at or
//! above the strike, stay flat below it.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::replication::{
    payoff_comparison, HedgingStrategy, ReplicationOutcome, ReplicationRequest, SimulationError,
};
use crate::pricing::{OptionParams, Pricing, VanillaOption};

/// Replicates the option with an all-or-nothing position around the strike.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FixedLevelHedge;

impl FixedLevelHedge {
    pub fn new() -> Self {
        Self
    }
}

impl HedgingStrategy for FixedLevelHedge {
    fn name(&self) -> &'static str {
        "fixed_level_hedge"
    }

    fn replicate(&self, request: &ReplicationRequest<'_>) -> Result<ReplicationOutcome, SimulationError> {
        let (first, last) = request.checked_path()?;
        let params = &request.params;
        let strike = first.price;

        let mut position = 0.0_f64;
        let mut outcome = ReplicationOutcome::default();
        let mut rf_accumulation_start = request.start;

        for point in &request.path[..request.path.len() - 1] {
            let target = if point.price >= strike { 1.0 } else { 0.0 };
            let change = target - position;
            if change != 0.0 {
                outcome.cash_flows_sum += -params.notional * change * point.price;
                outcome.spread_paid += (params.notional * change * params.spread).abs();
                outcome.hedge_points += 1;
                position = target;
            }

            if point.timestamp - rf_accumulation_start >= Duration::days(1) {
                outcome.rf_paid += position * params.daily_funding();
                rf_accumulation_start = point.timestamp;
            }
        }

        outcome.cash_flows_sum += params.notional * position * last.price;
        outcome.spread_paid += (params.notional * position * params.spread).abs();

        // Reference premium at inception, when a volatility is available.
        let term = request.term_at(first.timestamp);
        let premium_fraction = match request.volatility_at(first.timestamp).value() {
            Some(vol) if term > 0.0 => {
                let option = VanillaOption::call(OptionParams::at_the_money(
                    term,
                    vol,
                    first.price,
                    strike,
                    params.rate_differential,
                ))?;
                outcome.premium_path.push(option.price());
                option.price_fraction()
            }
            _ => 0.0,
        };
        outcome.payoff_comparison = payoff_comparison(params.notional, strike, last.price, premium_fraction);

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{PricePoint, ReturnSeries};
    use crate::hedging::{HedgeParameters, VolatilityInput};
    use crate::volatility::VolatilitySignal;
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, NaiveDateTime};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 6, 1).unwrap().and_hms_opt(10, 0, 0).unwrap()
    }

    fn replicate(path: &[PricePoint]) -> ReplicationOutcome {
        let returns = ReturnSeries::default();
        let request = ReplicationRequest {
            path,
            returns: &returns,
            start: start(),
            end: start() + Duration::days(5),
            volatility: VolatilityInput::Fixed(VolatilitySignal::Available(0.1)),
            params: HedgeParameters {
                notional: 1000.0,
                spread: 0.01,
                rate_differential: 0.0365,
                delta_seconds: 3600,
            },
        };
        FixedLevelHedge.replicate(&request).unwrap()
    }

    #[test]
    fn test_buys_at_inception_and_toggles_around_strike() {
        let path: Vec<PricePoint> = [100.0, 99.0, 101.0, 102.0]
            .iter()
            .enumerate()
            .map(|(i, &p)| PricePoint::new(start() + Duration::hours(i as i64), p))
            .collect();
        let outcome = replicate(&path);

        // Buy at 100, sell at 99, buy at 101, unwind at 102.
        assert_eq!(outcome.hedge_points, 3);
        assert_relative_eq!(outcome.cash_flows_sum, 1000.0 * (-100.0 + 99.0 - 101.0 + 102.0));
        assert_relative_eq!(outcome.spread_paid, 4.0 * 10.0);
        assert_eq!(outcome.rf_paid, 0.0);
        assert_eq!(outcome.premium_path.len(), 1);
    }

    #[test]
    fn test_funding_only_while_holding() {
        let path = vec![
            PricePoint::new(start(), 100.0),
            PricePoint::new(start() + Duration::days(1), 98.0),
            PricePoint::new(start() + Duration::days(2), 101.0),
            PricePoint::new(start() + Duration::days(3), 103.0),
        ];
        let outcome = replicate(&path);

        // Flat on day 1, long on day 2: one day of funding at 0.0365 / 365.
        assert_relative_eq!(outcome.rf_paid, 1000.0 * 0.0365 / 365.0, epsilon = 1e-12);
        assert_relative_eq!(outcome.cost(), outcome.cash_flows_sum + outcome.rf_paid);
    }
}
