//! Black-Scholes option pricing.
//!
//! Provides:
//! - `VanillaOption`: European call/put premium, Greeks and payoff
//! - `CompositeOption`: weighted vanilla portfolios (straddles, spreads)
//! - `implied_volatility`: premium to volatility inversion

pub mod composite;
pub mod implied;
pub mod types;
pub mod vanilla;

pub use composite::{CompositeOption, OptionLeg};
pub use implied::{implied_volatility, MAX_IMPLIED_VOL, MIN_IMPLIED_VOL};
pub use types::{Greeks, OptionKind, OptionParams, Pricing};
pub use vanilla::{PricingError, VanillaOption};
