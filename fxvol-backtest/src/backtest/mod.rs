//! Onshore/offshore volatility backtest.
//!
//! This module provides the backtest driver:
//! - Calendar windows with both-sides data availability checks
//! - Pre-window realized vol and the buy/sell decision rule
//! - Parallel per-window replication on both markets, or on one alone
//! - PnL records, diagnostics and statistics

pub mod config;
pub mod decision;
pub mod engine;
pub mod windows;

pub use config::{BacktestConfig, ConfigError, RunParameters};
pub use decision::TradeDirection;
pub use engine::{
    BacktestEngine, BacktestError, BacktestMode, BacktestRecord, BacktestResult, HedgeDiagnostics, MarketData,
    WindowDiagnostics,
};
pub use windows::{BacktestWindow, BacktestWindows};
