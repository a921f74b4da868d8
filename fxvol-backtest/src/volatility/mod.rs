//! Volatility estimation.

pub mod realized;

pub use realized::{implied_covariance, CorrelationTrade, RealizedVolEstimator, VolatilitySignal};
