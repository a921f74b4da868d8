//! PnL metrics module.
//!
//! Provides statistics over the per-window PnL distribution:
//! - Mean, population std, Sharpe ratio
//! - One-sided t-test and significance flag
//! - Win rate, profit factor
//! - Cumulative PnL and maximum drawdown

pub mod calculator;

pub use calculator::{DrawdownAnalysis, MetricsCalculator, MetricsError, PnlStatistics};
