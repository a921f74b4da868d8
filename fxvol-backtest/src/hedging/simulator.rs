//! Dynamic delta-hedge replication of an ATM call.
//!
//! Walks the path once. At every point but the last:
//! - take the volatility in force (fixed or trailing realized)
//! - price an ATM call struck at the window's first spot
//! - rebalance to the new delta only when the expected gamma slippage of
//!   staying put covers the spread of the rebalance (ties trade)
//! - accrue one day of funding on the held delta once a day has passed
//!
//! The last point unwinds whatever delta is held.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::replication::{
    payoff_comparison, HedgeParameters, HedgingStrategy, ReplicationOutcome, ReplicationRequest,
    SimulationError,
};
use crate::pricing::{OptionParams, Pricing, VanillaOption};
use crate::volatility::RealizedVolEstimator;

/// Per-run hedge book. Owned by a single replication and dropped with it.
#[derive(Debug, Clone)]
struct HedgeState {
    delta_old: f64,
    spot_last_hedged: f64,
    cash_flows_sum: f64,
    rf_paid: f64,
    spread_paid: f64,
    rf_accumulation_start: NaiveDateTime,
    delta_hedge_points: usize,
}

impl HedgeState {
    fn new(start: NaiveDateTime) -> Self {
        Self {
            delta_old: 0.0,
            spot_last_hedged: 0.0,
            cash_flows_sum: 0.0,
            rf_paid: 0.0,
            spread_paid: 0.0,
            rf_accumulation_start: start,
            delta_hedge_points: 0,
        }
    }

    /// Rebalance to `option`'s delta if the no-trade band allows it.
    fn consider_hedge(
        &mut self,
        option: &VanillaOption,
        spot: f64,
        vol: f64,
        params: &HedgeParameters,
        periods_per_year: f64,
    ) {
        let new_delta = option.delta();
        let delta_change = new_delta - self.delta_old;
        if delta_change.is_nan() {
            return;
        }

        let notional = params.notional;
        let cash_flow = -notional * delta_change * spot;
        let spread_cost = (notional * delta_change * params.spread).abs();

        let variance_in_dollars = spot * spot * vol * vol / periods_per_year;
        let expected_loss = option.gamma() / 2.0 * (variance_in_dollars + spot - self.spot_last_hedged);
        let initial_spot = option.params().initial_spot;

        if notional / initial_spot * expected_loss >= spread_cost {
            self.cash_flows_sum += cash_flow;
            self.spread_paid += spread_cost;
            self.delta_old = new_delta;
            self.spot_last_hedged = spot;
            self.delta_hedge_points += 1;
        }
    }

    fn accrue_funding(&mut self, t: NaiveDateTime, params: &HedgeParameters) {
        if t - self.rf_accumulation_start >= Duration::days(1) {
            self.rf_paid += self.delta_old * params.daily_funding();
            self.rf_accumulation_start = t;
        }
    }

    fn unwind(&mut self, last_spot: f64, params: &HedgeParameters) {
        self.cash_flows_sum += params.notional * self.delta_old * last_spot;
        self.spread_paid += (params.notional * self.delta_old * params.spread).abs();
    }
}

/// Replicates the option by rebalancing to its Black-Scholes delta.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DynamicDeltaHedge;

impl DynamicDeltaHedge {
    pub fn new() -> Self {
        Self
    }
}

impl HedgingStrategy for DynamicDeltaHedge {
    fn name(&self) -> &'static str {
        "dynamic_delta_hedge"
    }

    fn replicate(&self, request: &ReplicationRequest<'_>) -> Result<ReplicationOutcome, SimulationError> {
        let (first, last) = request.checked_path()?;
        let params = &request.params;
        let initial_spot = first.price;
        let rate = params.rate_differential;
        let periods_per_year = RealizedVolEstimator::new(params.delta_seconds).periods_per_year();

        let mut state = HedgeState::new(request.start);
        let mut premium_path = Vec::new();

        for point in &request.path[..request.path.len() - 1] {
            let t = point.timestamp;
            let term = request.term_at(t);

            if let Some(vol) = request.volatility_at(t).value() {
                if term > 0.0 {
                    let option = VanillaOption::call(OptionParams::at_the_money(
                        term,
                        vol,
                        point.price,
                        initial_spot,
                        rate,
                    ))?;
                    premium_path.push(option.price());
                    state.consider_hedge(&option, point.price, vol, params, periods_per_year);
                }
            }

            state.accrue_funding(t, params);
        }

        state.unwind(last.price, params);

        let premium_fraction = premium_path.first().map_or(0.0, |p| p / initial_spot);
        Ok(ReplicationOutcome {
            cash_flows_sum: state.cash_flows_sum,
            rf_paid: state.rf_paid,
            spread_paid: state.spread_paid,
            hedge_points: state.delta_hedge_points,
            payoff_comparison: payoff_comparison(params.notional, initial_spot, last.price, premium_fraction),
            premium_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{PricePoint, ReturnSeries};
    use crate::hedging::VolatilityInput;
    use crate::volatility::VolatilitySignal;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    const NOTIONAL: f64 = 1_000_000.0;
    const RATE: f64 = 0.021;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 6, 1).unwrap().and_hms_opt(10, 0, 0).unwrap()
    }

    fn params(spread: f64) -> HedgeParameters {
        HedgeParameters {
            notional: NOTIONAL,
            spread,
            rate_differential: RATE,
            delta_seconds: 3600,
        }
    }

    fn request<'a>(
        path: &'a [PricePoint],
        returns: &'a ReturnSeries,
        vol: VolatilitySignal,
        spread: f64,
    ) -> ReplicationRequest<'a> {
        ReplicationRequest {
            path,
            returns,
            start: start(),
            end: start() + Duration::days(5),
            volatility: VolatilityInput::Fixed(vol),
            params: params(spread),
        }
    }

    fn hourly_path(prices: &[f64]) -> Vec<PricePoint> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PricePoint::new(start() + Duration::hours(i as i64), p))
            .collect()
    }

    fn delta_at(term: f64, spot: f64, initial_spot: f64) -> f64 {
        VanillaOption::call(OptionParams::at_the_money(term, 0.1, spot, initial_spot, RATE))
            .unwrap()
            .delta()
    }

    #[test]
    fn test_path_too_short() {
        let returns = ReturnSeries::default();
        let path = hourly_path(&[75.0]);
        let result = DynamicDeltaHedge.replicate(&request(&path, &returns, VolatilitySignal::Available(0.1), 0.002));
        assert!(matches!(result, Err(SimulationError::PathTooShort(1))));
    }

    #[test]
    fn test_wide_spread_never_trades() {
        let returns = ReturnSeries::default();
        let path = hourly_path(&[75.0, 75.2, 74.9, 75.4, 75.1]);
        let outcome = DynamicDeltaHedge
            .replicate(&request(&path, &returns, VolatilitySignal::Available(0.1), 10.0))
            .unwrap();

        assert_eq!(outcome.hedge_points, 0);
        assert_eq!(outcome.cash_flows_sum, 0.0);
        assert_eq!(outcome.spread_paid, 0.0);
        assert_eq!(outcome.rf_paid, 0.0);
        // The option is still priced at every point but the last.
        assert_eq!(outcome.premium_path.len(), 4);
    }

    #[test]
    fn test_single_trade_two_point_path() {
        let returns = ReturnSeries::default();
        let path = hourly_path(&[75.0, 75.6]);
        let spread = 0.002;
        let outcome = DynamicDeltaHedge
            .replicate(&request(&path, &returns, VolatilitySignal::Available(0.1), spread))
            .unwrap();

        let delta = delta_at(5.0 / 252.0, 75.0, 75.0);
        let expected_cash = -NOTIONAL * delta * 75.0 + NOTIONAL * delta * 75.6;
        let expected_spread = 2.0 * (NOTIONAL * delta * spread).abs();

        assert_eq!(outcome.hedge_points, 1);
        assert_relative_eq!(outcome.cash_flows_sum, expected_cash, epsilon = 1e-6);
        assert_relative_eq!(outcome.spread_paid, expected_spread, epsilon = 1e-9);
        assert_eq!(outcome.rf_paid, 0.0);
        assert_relative_eq!(outcome.cost(), NOTIONAL * delta * 0.6, epsilon = 1e-6);
    }

    #[test]
    fn test_funding_accrues_on_post_trade_delta() {
        let returns = ReturnSeries::default();
        let t1 = start() + Duration::days(1);
        let path = vec![
            PricePoint::new(start(), 75.0),
            PricePoint::new(t1, 75.5),
            PricePoint::new(start() + Duration::days(2), 75.8),
        ];
        let outcome = DynamicDeltaHedge
            .replicate(&request(&path, &returns, VolatilitySignal::Available(0.1), 0.0))
            .unwrap();

        assert_eq!(outcome.hedge_points, 2);
        let delta1 = delta_at(4.0 / 252.0, 75.5, 75.0);
        assert_relative_eq!(outcome.rf_paid, NOTIONAL * delta1 * RATE / 365.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unavailable_vol_skips_pricing_but_keeps_funding_clock() {
        let returns = ReturnSeries::default();
        let path = hourly_path(&[75.0, 75.3, 75.1]);
        for vol in [VolatilitySignal::Unavailable, VolatilitySignal::Available(0.0)] {
            let outcome = DynamicDeltaHedge
                .replicate(&request(&path, &returns, vol, 0.002))
                .unwrap();
            assert_eq!(outcome.hedge_points, 0);
            assert!(outcome.premium_path.is_empty());
            assert_eq!(outcome.cost(), 0.0);
            assert_relative_eq!(outcome.payoff_comparison, NOTIONAL * 0.1 / 75.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_rolling_vol_uses_trailing_returns() {
        let path = hourly_path(&[75.0, 75.2, 75.1]);
        // Returns before the window only; the rolling lookback reaches them.
        let returns = ReturnSeries::new(
            (1..40)
                .map(|h| crate::data::ReturnPoint {
                    timestamp: start() - Duration::hours(h),
                    value: if h % 2 == 0 { 0.002 } else { -0.002 },
                })
                .collect(),
        );
        let mut req = request(&path, &returns, VolatilitySignal::Unavailable, 0.0);
        req.volatility = VolatilityInput::Rolling;

        let outcome = DynamicDeltaHedge.replicate(&req).unwrap();
        assert_eq!(outcome.premium_path.len(), 2);
        assert!(outcome.hedge_points >= 1);
    }

    #[test]
    fn test_invalid_spot_is_an_error() {
        let returns = ReturnSeries::default();
        let path = hourly_path(&[75.0, -1.0, 75.0]);
        let result = DynamicDeltaHedge.replicate(&request(&path, &returns, VolatilitySignal::Available(0.1), 0.0));
        assert!(matches!(result, Err(SimulationError::Pricing(_))));
    }
}
