//! Option replication by hedging in spot.
//!
//! This module provides:
//! - `HedgingStrategy`: the replication capability the backtest drives
//! - `DynamicDeltaHedge`: Black-Scholes delta rebalancing with a no-trade band
//! - `FixedLevelHedge`: full or flat hedge around the strike
//! - `SpreadModel`: bid/offer cost of hedge trades

pub mod fixed_level;
pub mod replication;
pub mod simulator;
pub mod spread;

pub use fixed_level::FixedLevelHedge;
pub use replication::{
    payoff_comparison, HedgeParameters, HedgingStrategy, ReplicationOutcome, ReplicationRequest,
    SimulationError, VolatilityInput,
};
pub use simulator::DynamicDeltaHedge;
pub use spread::SpreadModel;
