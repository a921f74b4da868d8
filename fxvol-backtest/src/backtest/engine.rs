//! Core backtesting engine.
//!
//! For every window of `days_strategy` calendar days:
//! 1. Skip it unless both sources quote on the start date
//! 2. Slice both price paths to `[start, end]`
//! 3. Estimate each side's realized vol over the lookback before the start
//! 4. Replicate the option on each side with the configured strategy
//! 5. Decide which side's vol is bought and which is sold
//! 6. Record the window's PnL
//!
//! `run_single_side` replicates on one source only and records the net
//! replication cost of every window that traded; no decision rule applies.
//!
//! Windows are independent and evaluated in parallel; results are sorted by
//! start date before they are returned.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::data::{Granularity, MarketSide, PricePoint, PriceSeries, ReturnSeries};
use crate::hedging::{
    HedgeParameters, HedgingStrategy, ReplicationOutcome, ReplicationRequest, SimulationError,
    VolatilityInput,
};
use crate::metrics::{DrawdownAnalysis, MetricsCalculator, MetricsError, PnlStatistics};
use crate::volatility::{RealizedVolEstimator, VolatilitySignal};

use super::config::{BacktestConfig, ConfigError, RunParameters};
use super::decision::TradeDirection;
use super::windows::{BacktestWindow, BacktestWindows};

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Both sources' prices and returns, standardized and sorted.
#[derive(Debug, Clone)]
pub struct MarketData {
    pub onshore_prices: PriceSeries,
    pub offshore_prices: PriceSeries,
    pub onshore_returns: ReturnSeries,
    pub offshore_returns: ReturnSeries,
}

impl MarketData {
    /// Build from already standardized prices, deriving returns at
    /// `delta_seconds`.
    pub fn new(onshore_prices: PriceSeries, offshore_prices: PriceSeries, delta_seconds: i64) -> Self {
        let onshore_returns = ReturnSeries::from_prices(&onshore_prices, delta_seconds);
        let offshore_returns = ReturnSeries::from_prices(&offshore_prices, delta_seconds);
        Self {
            onshore_prices,
            offshore_prices,
            onshore_returns,
            offshore_returns,
        }
    }

    /// Floor raw timestamps to the granularity implied by `delta_seconds`,
    /// sort, and derive returns.
    pub fn from_raw_prices(onshore: &PriceSeries, offshore: &PriceSeries, delta_seconds: i64) -> Self {
        let granularity = Granularity::from_delta_seconds(delta_seconds);
        Self::new(
            onshore.standardized(granularity),
            offshore.standardized(granularity),
            delta_seconds,
        )
    }

    pub fn prices(&self, side: MarketSide) -> &PriceSeries {
        match side {
            MarketSide::Onshore => &self.onshore_prices,
            MarketSide::Offshore => &self.offshore_prices,
        }
    }

    pub fn returns(&self, side: MarketSide) -> &ReturnSeries {
        match side {
            MarketSide::Onshore => &self.onshore_returns,
            MarketSide::Offshore => &self.offshore_returns,
        }
    }
}

/// Which markets a run replicates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacktestMode {
    /// Buy the lower-vol side, sell the higher-vol side.
    Paired,
    /// Replicate on one source and keep its net cost.
    SingleSide(MarketSide),
}

impl BacktestMode {
    pub fn describe(&self) -> String {
        match self {
            Self::Paired => "paired".to_string(),
            Self::SingleSide(side) => format!("{} only", side.as_str()),
        }
    }
}

/// One traded window.
///
/// Single-side runs leave the other side's vol and the direction empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestRecord {
    pub start: NaiveDateTime,
    pub realized_vol_onshore: Option<f64>,
    pub realized_vol_offshore: Option<f64>,
    pub direction: Option<TradeDirection>,
    pub pnl: f64,
}

/// Per-side replication details, kept for inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HedgeDiagnostics {
    pub start: NaiveDateTime,
    pub side: MarketSide,
    pub hedge_points: usize,
    pub replication_cost: f64,
    pub transaction_cost: f64,
    pub payoff_comparison: f64,
    pub premium_at_inception: Option<f64>,
    /// Option premium at every priced point of the path.
    pub premium_path: Vec<f64>,
}

impl HedgeDiagnostics {
    fn new(start: NaiveDateTime, side: MarketSide, outcome: &ReplicationOutcome) -> Self {
        Self {
            start,
            side,
            hedge_points: outcome.hedge_points,
            replication_cost: outcome.cost(),
            transaction_cost: outcome.transaction_cost(),
            payoff_comparison: outcome.payoff_comparison,
            premium_at_inception: outcome.premium_path.first().copied(),
            premium_path: outcome.premium_path.clone(),
        }
    }
}

/// Window accounting of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowDiagnostics {
    pub windows_possible: usize,
    pub windows_missing_data: usize,
    pub windows_insufficient_points: usize,
    pub windows_no_signal: usize,
    pub windows_traded: usize,
}

/// Outcome of a single window.
#[derive(Debug, Clone)]
enum WindowOutcome {
    MissingData,
    InsufficientPoints,
    NoSignal,
    Traded(BacktestRecord),
}

#[derive(Debug, Clone)]
struct WindowEvaluation {
    outcome: WindowOutcome,
    hedges: Vec<HedgeDiagnostics>,
}

impl WindowEvaluation {
    fn skipped(outcome: WindowOutcome) -> Self {
        Self {
            outcome,
            hedges: Vec::new(),
        }
    }
}

/// Result of a backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub mode: BacktestMode,
    pub parameters: RunParameters,
    pub records: Vec<BacktestRecord>,
    /// `(onshore, offshore)` pre-window vols of each traded window.
    pub vol_history: Vec<(Option<f64>, Option<f64>)>,
    pub backtesting_dates: Vec<NaiveDateTime>,
    pub hedge_diagnostics: Vec<HedgeDiagnostics>,
    pub diagnostics: WindowDiagnostics,
    pub risk_free_rate: f64,
    pub significance: f64,
}

impl BacktestResult {
    pub fn pnl(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.pnl).collect()
    }

    /// Distribution statistics of the traded windows.
    pub fn statistics(&self) -> Result<PnlStatistics, MetricsError> {
        MetricsCalculator::pnl_statistics(&self.pnl(), self.risk_free_rate, self.significance)
    }

    /// Running PnL by window start.
    pub fn cumulative_pnl(&self) -> Vec<(NaiveDateTime, f64)> {
        self.backtesting_dates
            .iter()
            .copied()
            .zip(MetricsCalculator::cumulative(&self.pnl()))
            .collect()
    }

    pub fn drawdown(&self) -> DrawdownAnalysis {
        MetricsCalculator::analyze_drawdown(&self.cumulative_pnl())
    }

    /// Generate a summary report.
    pub fn summary(&self) -> String {
        let d = &self.diagnostics;
        let mut out = format!(
            "Backtest ({}): {} days, {} vol, threshold {:.4}\n\
             Windows: {} possible, {} traded, {} missing data, {} too few points, {} no signal\n",
            self.mode.describe(),
            self.parameters.days_strategy,
            if self.parameters.use_fixed_vol { "fixed" } else { "rolling" },
            self.parameters.vol_diff_significance,
            d.windows_possible,
            d.windows_traded,
            d.windows_missing_data,
            d.windows_insufficient_points,
            d.windows_no_signal,
        );

        match self.statistics() {
            Ok(stats) => {
                out.push('\n');
                out.push_str(&stats.summary());
                let drawdown = self.drawdown();
                out.push_str(&format!("\nMax Drawdown: {:.2}", drawdown.max_drawdown));
            }
            Err(e) => out.push_str(&format!("\nStatistics unavailable: {}", e)),
        }
        out
    }
}

/// Backtest engine driving one hedging strategy.
pub struct BacktestEngine<S: HedgingStrategy> {
    config: BacktestConfig,
    strategy: S,
}

impl<S: HedgingStrategy> BacktestEngine<S> {
    /// Create an engine; fails on an invalid config.
    pub fn new(config: BacktestConfig, strategy: S) -> Result<Self, BacktestError> {
        config.validate()?;
        Ok(Self { config, strategy })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Run the backtest over every window of `run.days_strategy` days.
    pub fn run_backtest(&self, data: &MarketData, run: &RunParameters) -> Result<BacktestResult, BacktestError> {
        run.validate()
            .map_err(|e| BacktestError::InvalidConfig(e.to_string()))?;

        let onshore_params = self.config.hedge_parameters(MarketSide::Onshore)?;
        let offshore_params = self.config.hedge_parameters(MarketSide::Offshore)?;

        let windows = BacktestWindows::new(self.config.start, self.config.end, run.days_strategy).generate();
        let onshore_days = data.onshore_prices.available_days();
        let offshore_days = data.offshore_prices.available_days();

        info!(
            "Running {} for {}: {} windows of {} days (fixed vol: {}, threshold: {})",
            self.strategy.name(),
            self.config.asset,
            windows.len(),
            run.days_strategy,
            run.use_fixed_vol,
            run.vol_diff_significance
        );

        let evaluations = self.evaluate_windows(&windows, |window| {
            if window.is_tradable(&onshore_days, &offshore_days) {
                self.evaluate_window(data, window, run, &onshore_params, &offshore_params)
            } else {
                debug!("{}: missing data on one side", window.start_date());
                Ok(WindowEvaluation::skipped(WindowOutcome::MissingData))
            }
        })?;

        Ok(self.finish(BacktestMode::Paired, run, windows.len(), evaluations))
    }

    /// Replicate on `side` alone over every window, recording each window's
    /// net replication cost. `run.vol_diff_significance` is not used.
    pub fn run_single_side(
        &self,
        data: &MarketData,
        side: MarketSide,
        run: &RunParameters,
    ) -> Result<BacktestResult, BacktestError> {
        run.validate()
            .map_err(|e| BacktestError::InvalidConfig(e.to_string()))?;

        let params = self.config.hedge_parameters(side)?;
        let windows = BacktestWindows::new(self.config.start, self.config.end, run.days_strategy).generate();
        let days = data.prices(side).available_days();

        info!(
            "Running {} for {} on {} only: {} windows of {} days (fixed vol: {})",
            self.strategy.name(),
            self.config.asset,
            side.as_str(),
            windows.len(),
            run.days_strategy,
            run.use_fixed_vol
        );

        let evaluations = self.evaluate_windows(&windows, |window| {
            if window.quotes_on(&days) {
                self.evaluate_single_window(data, window, side, run, &params)
            } else {
                debug!("{}: no {} data", window.start_date(), side.as_str());
                Ok(WindowEvaluation::skipped(WindowOutcome::MissingData))
            }
        })?;

        Ok(self.finish(BacktestMode::SingleSide(side), run, windows.len(), evaluations))
    }

    fn evaluate_windows<F>(&self, windows: &[BacktestWindow], evaluate: F) -> Result<Vec<WindowEvaluation>, BacktestError>
    where
        F: Fn(&BacktestWindow) -> Result<WindowEvaluation, BacktestError> + Sync,
    {
        let progress = AtomicUsize::new(0);
        let total = windows.len();

        windows
            .par_iter()
            .map(|window| -> Result<WindowEvaluation, BacktestError> {
                let evaluation = evaluate(window)?;

                let done = progress.fetch_add(1, Ordering::Relaxed) + 1;
                if done % (total / 10).max(1) == 0 || done == total {
                    info!(
                        "  {:.0}% ({}/{} windows)",
                        done as f64 / total as f64 * 100.0,
                        done,
                        total
                    );
                }

                Ok(evaluation)
            })
            .collect()
    }

    fn finish(
        &self,
        mode: BacktestMode,
        run: &RunParameters,
        total: usize,
        evaluations: Vec<WindowEvaluation>,
    ) -> BacktestResult {
        let mut diagnostics = WindowDiagnostics {
            windows_possible: total,
            ..Default::default()
        };
        let mut records = Vec::new();
        let mut hedge_diagnostics = Vec::new();

        for evaluation in evaluations {
            hedge_diagnostics.extend(evaluation.hedges);
            match evaluation.outcome {
                WindowOutcome::MissingData => diagnostics.windows_missing_data += 1,
                WindowOutcome::InsufficientPoints => diagnostics.windows_insufficient_points += 1,
                WindowOutcome::NoSignal => diagnostics.windows_no_signal += 1,
                WindowOutcome::Traded(record) => {
                    diagnostics.windows_traded += 1;
                    records.push(record);
                }
            }
        }

        records.sort_by_key(|r| r.start);
        hedge_diagnostics.sort_by_key(|h| h.start);

        info!(
            "Backtest complete ({}): {}/{} windows traded ({} missing data, {} too few points, {} no signal)",
            mode.describe(),
            diagnostics.windows_traded,
            diagnostics.windows_possible,
            diagnostics.windows_missing_data,
            diagnostics.windows_insufficient_points,
            diagnostics.windows_no_signal
        );

        BacktestResult {
            mode,
            parameters: *run,
            vol_history: records
                .iter()
                .map(|r| (r.realized_vol_onshore, r.realized_vol_offshore))
                .collect(),
            backtesting_dates: records.iter().map(|r| r.start).collect(),
            records,
            hedge_diagnostics,
            diagnostics,
            risk_free_rate: self.config.rf_base_ccy,
            significance: self.config.significance,
        }
    }

    fn evaluate_window(
        &self,
        data: &MarketData,
        window: &BacktestWindow,
        run: &RunParameters,
        onshore_params: &HedgeParameters,
        offshore_params: &HedgeParameters,
    ) -> Result<WindowEvaluation, BacktestError> {
        let onshore_path = data.onshore_prices.slice(window.start, window.end);
        let offshore_path = data.offshore_prices.slice(window.start, window.end);
        if onshore_path.len() < 2 || offshore_path.len() < 2 {
            debug!(
                "{}: too few points (onshore {}, offshore {})",
                window.start_date(),
                onshore_path.len(),
                offshore_path.len()
            );
            return Ok(WindowEvaluation::skipped(WindowOutcome::InsufficientPoints));
        }

        let estimator = RealizedVolEstimator::new(self.config.delta_seconds);
        let vol_onshore = estimator.estimate_window(&data.onshore_returns, window.lookback_start, window.start);
        let vol_offshore = estimator.estimate_window(&data.offshore_returns, window.lookback_start, window.start);

        let onshore = self.replicate(data, window, MarketSide::Onshore, onshore_path, vol_onshore, run, onshore_params)?;
        let offshore =
            self.replicate(data, window, MarketSide::Offshore, offshore_path, vol_offshore, run, offshore_params)?;

        let hedges = vec![
            HedgeDiagnostics::new(window.start, MarketSide::Onshore, &onshore),
            HedgeDiagnostics::new(window.start, MarketSide::Offshore, &offshore),
        ];
        let no_signal = |reason: &str| {
            debug!("{}: {}", window.start_date(), reason);
            WindowEvaluation {
                outcome: WindowOutcome::NoSignal,
                hedges: hedges.clone(),
            }
        };

        let (vol_on, vol_off) = match (vol_onshore.value(), vol_offshore.value()) {
            (Some(on), Some(off)) => (on, off),
            _ => return Ok(no_signal("pre-window vol unavailable")),
        };

        let direction = match TradeDirection::decide(vol_on, vol_off, run.vol_diff_significance) {
            Some(direction) => direction,
            None => return Ok(no_signal("vol difference not significant")),
        };

        if onshore.cost() == 0.0 || offshore.cost() == 0.0 {
            return Ok(no_signal("replication never traded"));
        }

        let record = BacktestRecord {
            start: window.start,
            realized_vol_onshore: Some(vol_on),
            realized_vol_offshore: Some(vol_off),
            direction: Some(direction),
            pnl: direction.pnl(&onshore, &offshore),
        };

        Ok(WindowEvaluation {
            outcome: WindowOutcome::Traded(record),
            hedges,
        })
    }

    fn evaluate_single_window(
        &self,
        data: &MarketData,
        window: &BacktestWindow,
        side: MarketSide,
        run: &RunParameters,
        params: &HedgeParameters,
    ) -> Result<WindowEvaluation, BacktestError> {
        let path = data.prices(side).slice(window.start, window.end);
        if path.len() < 2 {
            debug!("{}: too few {} points ({})", window.start_date(), side.as_str(), path.len());
            return Ok(WindowEvaluation::skipped(WindowOutcome::InsufficientPoints));
        }

        let estimator = RealizedVolEstimator::new(self.config.delta_seconds);
        let vol = estimator.estimate_window(data.returns(side), window.lookback_start, window.start);
        let outcome = self.replicate(data, window, side, path, vol, run, params)?;
        let hedges = vec![HedgeDiagnostics::new(window.start, side, &outcome)];

        let pnl = outcome.net();
        if pnl == 0.0 {
            debug!("{}: replication never traded", window.start_date());
            return Ok(WindowEvaluation {
                outcome: WindowOutcome::NoSignal,
                hedges,
            });
        }

        let (realized_vol_onshore, realized_vol_offshore) = match side {
            MarketSide::Onshore => (vol.value(), None),
            MarketSide::Offshore => (None, vol.value()),
        };
        let record = BacktestRecord {
            start: window.start,
            realized_vol_onshore,
            realized_vol_offshore,
            direction: None,
            pnl,
        };

        Ok(WindowEvaluation {
            outcome: WindowOutcome::Traded(record),
            hedges,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn replicate(
        &self,
        data: &MarketData,
        window: &BacktestWindow,
        side: MarketSide,
        path: &[PricePoint],
        pre_window_vol: VolatilitySignal,
        run: &RunParameters,
        params: &HedgeParameters,
    ) -> Result<ReplicationOutcome, BacktestError> {
        let request = ReplicationRequest {
            path,
            returns: data.returns(side),
            start: window.start,
            end: window.end,
            volatility: if run.use_fixed_vol {
                VolatilityInput::Fixed(pre_window_vol)
            } else {
                VolatilityInput::Rolling
            },
            params: *params,
        };
        Ok(self.strategy.replicate(&request)?)
    }
}
