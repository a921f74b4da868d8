//! Analytic Black-Scholes pricer for European calls and puts.
//!
//! Premium and Greeks are computed from a shared call core; puts are derived
//! through put-call parity. Gamma uses `S * sigma * T` in the denominator, the
//! convention the hedging no-trade band is calibrated against.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use super::types::{OptionKind, OptionParams, Pricing};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    #[error("Invalid option parameter: {name} must be a positive number, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("Implied volatility did not converge for premium {premium}")]
    NoConvergence { premium: f64 },
}

/// European call or put.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VanillaOption {
    kind: OptionKind,
    params: OptionParams,
}

fn require_positive(name: &'static str, value: f64) -> Result<(), PricingError> {
    // NaN fails the comparison as well.
    if value > 0.0 {
        Ok(())
    } else {
        Err(PricingError::InvalidParameter { name, value })
    }
}

impl VanillaOption {
    /// Create an option, rejecting non-positive or NaN term, volatility,
    /// spot, initial spot and strike.
    pub fn new(kind: OptionKind, params: OptionParams) -> Result<Self, PricingError> {
        require_positive("term", params.term)?;
        require_positive("volatility", params.volatility)?;
        require_positive("spot", params.spot)?;
        require_positive("initial_spot", params.initial_spot)?;
        require_positive("strike", params.strike)?;
        Ok(Self { kind, params })
    }

    pub fn call(params: OptionParams) -> Result<Self, PricingError> {
        Self::new(OptionKind::Call, params)
    }

    pub fn put(params: OptionParams) -> Result<Self, PricingError> {
        Self::new(OptionKind::Put, params)
    }

    pub fn kind(&self) -> OptionKind {
        self.kind
    }

    pub fn params(&self) -> &OptionParams {
        &self.params
    }

    /// Strike over current spot.
    pub fn moneyness(&self) -> f64 {
        self.params.strike / self.params.spot
    }

    /// Calculate d1 parameter.
    fn d1(&self) -> f64 {
        let p = &self.params;
        let numerator = (p.spot / p.strike).ln() + (p.rate + 0.5 * p.volatility * p.volatility) * p.term;
        numerator / (p.volatility * p.term.sqrt())
    }

    /// Calculate d2 parameter.
    fn d2(&self) -> f64 {
        self.d1() - self.params.volatility * self.params.term.sqrt()
    }

    /// Standard normal CDF.
    fn norm_cdf(x: f64) -> f64 {
        let normal = Normal::new(0.0, 1.0).unwrap();
        normal.cdf(x)
    }

    /// Standard normal PDF.
    fn norm_pdf(x: f64) -> f64 {
        (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
    }

    fn discount(&self) -> f64 {
        (-self.params.rate * self.params.term).exp()
    }

    fn call_premium(&self) -> f64 {
        let p = &self.params;
        p.spot * Self::norm_cdf(self.d1()) - p.strike * self.discount() * Self::norm_cdf(self.d2())
    }

    fn call_theta(&self) -> f64 {
        let p = &self.params;
        let term1 = -p.spot * Self::norm_pdf(self.d1()) * p.volatility / (2.0 * p.term.sqrt());
        let term2 = p.rate * p.strike * self.discount() * Self::norm_cdf(self.d2());
        term1 - term2
    }

    fn call_rho(&self) -> f64 {
        let p = &self.params;
        p.strike * p.term * self.discount() * Self::norm_cdf(self.d2())
    }

    /// Premium as a fraction of the initial fixing.
    pub fn price_fraction(&self) -> f64 {
        self.price() / self.params.initial_spot
    }

    /// Fractional price less a quoted half-spread.
    pub fn bid(&self, spread_from_mid: f64) -> f64 {
        self.price_fraction() - spread_from_mid
    }

    /// Fractional price plus a quoted half-spread.
    pub fn offer(&self, spread_from_mid: f64) -> f64 {
        self.price_fraction() + spread_from_mid
    }

    /// Payoff as a fraction of the initial fixing, net of the premium paid
    /// (plus commission) carried to expiry at the rate differential.
    pub fn final_result(&self, commission_paid: f64) -> f64 {
        let p = &self.params;
        self.execute() / p.initial_spot
            - (self.price() / p.spot - commission_paid) * (1.0 + p.rate).powf(p.term)
    }
}

impl Pricing for VanillaOption {
    fn price(&self) -> f64 {
        let p = &self.params;
        match self.kind {
            OptionKind::Call => self.call_premium(),
            OptionKind::Put => self.call_premium() - p.spot + p.strike * self.discount(),
        }
    }

    fn delta(&self) -> f64 {
        let call_delta = Self::norm_cdf(self.d1());
        match self.kind {
            OptionKind::Call => call_delta,
            OptionKind::Put => call_delta - 1.0,
        }
    }

    fn gamma(&self) -> f64 {
        let p = &self.params;
        Self::norm_pdf(self.d1()) / (p.spot * p.volatility * p.term)
    }

    fn vega(&self) -> f64 {
        let p = &self.params;
        p.spot * p.term.sqrt() * Self::norm_pdf(self.d1())
    }

    fn theta(&self) -> f64 {
        match self.kind {
            OptionKind::Call => self.call_theta(),
            OptionKind::Put => {
                let p = &self.params;
                self.call_theta() + p.rate * p.strike * self.discount()
            }
        }
    }

    fn rho(&self) -> f64 {
        match self.kind {
            OptionKind::Call => self.call_rho(),
            OptionKind::Put => {
                let p = &self.params;
                self.call_rho() - p.strike * p.term * self.discount()
            }
        }
    }

    fn execute(&self) -> f64 {
        let p = &self.params;
        match self.kind {
            OptionKind::Call => (p.spot - p.strike).max(0.0),
            OptionKind::Put => (p.strike - p.spot).max(0.0),
        }
    }
}
