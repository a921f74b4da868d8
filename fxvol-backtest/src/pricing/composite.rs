//! Weighted portfolios of vanilla options.

use serde::{Deserialize, Serialize};

use super::types::{OptionKind, OptionParams, Pricing};
use super::vanilla::{PricingError, VanillaOption};

/// One weighted leg. Negative weights are short positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionLeg {
    pub weight: f64,
    pub option: VanillaOption,
}

/// Linear combination of vanilla options sharing term, spot and rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeOption {
    legs: Vec<OptionLeg>,
}

impl CompositeOption {
    pub fn new(legs: Vec<OptionLeg>) -> Self {
        Self { legs }
    }

    pub fn legs(&self) -> &[OptionLeg] {
        &self.legs
    }

    fn leg(kind: OptionKind, weight: f64, params: OptionParams) -> Result<OptionLeg, PricingError> {
        Ok(OptionLeg {
            weight,
            option: VanillaOption::new(kind, params)?,
        })
    }

    /// Long call and long put at the same strike.
    pub fn straddle(params: OptionParams) -> Result<Self, PricingError> {
        Ok(Self::new(vec![
            Self::leg(OptionKind::Call, 1.0, params)?,
            Self::leg(OptionKind::Put, 1.0, params)?,
        ]))
    }

    /// Long put at `put_strike` and long call at `call_strike`.
    pub fn strangle(params: OptionParams, put_strike: f64, call_strike: f64) -> Result<Self, PricingError> {
        Ok(Self::new(vec![
            Self::leg(OptionKind::Put, 1.0, params.with_strike(put_strike))?,
            Self::leg(OptionKind::Call, 1.0, params.with_strike(call_strike))?,
        ]))
    }

    /// Long call at `long_strike`, short call at `short_strike`.
    pub fn call_spread(params: OptionParams, long_strike: f64, short_strike: f64) -> Result<Self, PricingError> {
        Ok(Self::new(vec![
            Self::leg(OptionKind::Call, 1.0, params.with_strike(long_strike))?,
            Self::leg(OptionKind::Call, -1.0, params.with_strike(short_strike))?,
        ]))
    }

    /// Long put at `long_strike`, short put at `short_strike`.
    pub fn put_spread(params: OptionParams, long_strike: f64, short_strike: f64) -> Result<Self, PricingError> {
        Ok(Self::new(vec![
            Self::leg(OptionKind::Put, 1.0, params.with_strike(long_strike))?,
            Self::leg(OptionKind::Put, -1.0, params.with_strike(short_strike))?,
        ]))
    }

    fn weighted(&self, f: impl Fn(&VanillaOption) -> f64) -> f64 {
        self.legs.iter().map(|leg| leg.weight * f(&leg.option)).sum()
    }
}

impl Pricing for CompositeOption {
    fn price(&self) -> f64 {
        self.weighted(VanillaOption::price)
    }

    fn delta(&self) -> f64 {
        self.weighted(VanillaOption::delta)
    }

    fn gamma(&self) -> f64 {
        self.weighted(VanillaOption::gamma)
    }

    fn vega(&self) -> f64 {
        self.weighted(VanillaOption::vega)
    }

    fn theta(&self) -> f64 {
        self.weighted(VanillaOption::theta)
    }

    fn rho(&self) -> f64 {
        self.weighted(VanillaOption::rho)
    }

    fn execute(&self) -> f64 {
        self.weighted(VanillaOption::execute)
    }
}
