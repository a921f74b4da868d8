//! PnL distribution statistics.
//!
//! Zero entries are read as "no trade" and excluded before any statistic is
//! computed. Dispersion is the population standard deviation; the t-test is
//! one-sided against a zero mean with `n - 1` degrees of freedom. Sharpe and
//! the t-test are left empty for a single trade or a constant PnL.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::Statistics;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    #[error("No trades backtested yet")]
    NoTrades,

    #[error("Need at least 2 trades for a t-test, got {0}")]
    InsufficientTrades(usize),

    #[error("PnL has zero variance")]
    ZeroVariance,
}

/// Statistics of the per-trade PnL distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PnlStatistics {
    pub trades: usize,
    pub pnl_distribution_by_trades: Vec<f64>,
    pub pnl_total: f64,
    pub mean: f64,
    pub std: f64,
    pub sharpe_ratio: Option<f64>,
    pub t_statistic: Option<f64>,
    pub p_value: Option<f64>,
    pub significance: f64,
    pub is_significant: bool,

    pub winning_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub largest_winner: f64,
    pub largest_loser: f64,
}

impl PnlStatistics {
    /// Generate a summary report.
    pub fn summary(&self) -> String {
        format!(
            "PnL Statistics\n\
             ==============\n\
             \n\
             Trades: {} (W: {}, L: {})\n\
             Win Rate: {:.1}%\n\
             Profit Factor: {:.2}\n\
             \n\
             Total PnL: {:.2}\n\
             Mean PnL: {:.2}\n\
             Std PnL: {:.2}\n\
             Largest Win: {:.2}\n\
             Largest Loss: {:.2}\n\
             \n\
             Sharpe Ratio: {}\n\
             t-statistic: {}\n\
             p-value: {} ({} at {:.0}%)",
            self.trades,
            self.winning_trades,
            self.trades - self.winning_trades,
            self.win_rate * 100.0,
            self.profit_factor,
            self.pnl_total,
            self.mean,
            self.std,
            self.largest_winner,
            self.largest_loser,
            fmt_optional(self.sharpe_ratio, 3),
            fmt_optional(self.t_statistic, 3),
            fmt_optional(self.p_value, 4),
            if self.is_significant { "significant" } else { "not significant" },
            self.significance * 100.0,
        )
    }
}

fn fmt_optional(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "n/a".to_string(),
    }
}

/// Drawdown of a cumulative PnL curve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawdownAnalysis {
    pub max_drawdown: f64,
    pub max_drawdown_date: Option<NaiveDateTime>,
    pub peak_date: Option<NaiveDateTime>,
    pub recovery_date: Option<NaiveDateTime>,
    pub duration_days: i64,
    pub avg_drawdown: f64,
    pub drawdown_periods: usize,
}

/// Metrics calculator.
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Non-zero entries of `pnl`, in order.
    pub fn traded(pnl: &[f64]) -> Vec<f64> {
        pnl.iter().copied().filter(|p| *p != 0.0).collect()
    }

    /// Full statistics of a PnL series.
    pub fn pnl_statistics(pnl: &[f64], risk_free: f64, significance: f64) -> Result<PnlStatistics, MetricsError> {
        let traded = Self::traded(pnl);
        let n = traded.len();
        if n == 0 {
            return Err(MetricsError::NoTrades);
        }

        let mean = traded.iter().mean();
        let std = traded.iter().population_std_dev();
        let (t_statistic, p_value) = match Self::t_test(&traded) {
            Ok((t, p)) => (Some(t), Some(p)),
            Err(_) => (None, None),
        };

        let winning_trades = traded.iter().filter(|p| **p > 0.0).count();
        let gross_profit: f64 = traded.iter().filter(|p| **p > 0.0).sum();
        let gross_loss: f64 = traded.iter().filter(|p| **p < 0.0).sum();

        Ok(PnlStatistics {
            trades: n,
            pnl_total: traded.iter().sum(),
            mean,
            std,
            sharpe_ratio: (std > 0.0).then(|| (mean - risk_free) / std),
            t_statistic,
            p_value,
            significance,
            is_significant: p_value.is_some_and(|p| p <= significance),
            winning_trades,
            win_rate: winning_trades as f64 / n as f64,
            profit_factor: Self::calculate_profit_factor(gross_profit, gross_loss),
            largest_winner: traded.iter().copied().fold(0.0, f64::max),
            largest_loser: traded.iter().copied().fold(0.0, f64::min),
            pnl_distribution_by_trades: traded,
        })
    }

    /// One-sided t-test of a zero mean: `(t, P(T > t))`.
    pub fn t_test(traded: &[f64]) -> Result<(f64, f64), MetricsError> {
        let n = traded.len();
        if n == 0 {
            return Err(MetricsError::NoTrades);
        }
        if n < 2 {
            return Err(MetricsError::InsufficientTrades(n));
        }

        let std = traded.iter().population_std_dev();
        if !(std > 0.0) {
            return Err(MetricsError::ZeroVariance);
        }

        let t = traded.iter().mean() / std * (n as f64).sqrt();
        let dist = StudentsT::new(0.0, 1.0, (n - 1) as f64).map_err(|_| MetricsError::InsufficientTrades(n))?;
        Ok((t, 1.0 - dist.cdf(t)))
    }

    /// Running sum of `pnl`.
    pub fn cumulative(pnl: &[f64]) -> Vec<f64> {
        pnl.iter()
            .scan(0.0, |acc, p| {
                *acc += p;
                Some(*acc)
            })
            .collect()
    }

    /// Calculate profit factor.
    fn calculate_profit_factor(gross_profit: f64, gross_loss: f64) -> f64 {
        let loss = gross_loss.abs();
        if loss == 0.0 {
            return f64::INFINITY;
        }
        gross_profit / loss
    }

    /// Analyze drawdown of a dated cumulative PnL curve.
    pub fn analyze_drawdown(curve: &[(NaiveDateTime, f64)]) -> DrawdownAnalysis {
        let Some(&(first_date, first_value)) = curve.first() else {
            return DrawdownAnalysis::default();
        };

        let mut peak = first_value;
        let mut peak_date = first_date;
        let mut max_drawdown = 0.0;
        let mut max_drawdown_date = first_date;
        let mut max_peak_date = first_date;
        let mut recovery_date = None;
        let mut drawdown_start: Option<NaiveDateTime> = None;
        let mut max_duration = 0i64;
        let mut drawdowns = Vec::new();
        let mut periods = 0;

        for &(date, value) in curve {
            if value > peak {
                // New high
                if drawdown_start.take().is_some() {
                    periods += 1;
                    if max_peak_date == peak_date && max_drawdown > 0.0 && recovery_date.is_none() {
                        recovery_date = Some(date);
                    }
                }
                peak = value;
                peak_date = date;
            } else if value < peak {
                let drawdown = peak - value;
                let started = *drawdown_start.get_or_insert(date);
                let duration = (date - started).num_days();

                if drawdown > max_drawdown {
                    max_drawdown = drawdown;
                    max_drawdown_date = date;
                    max_peak_date = peak_date;
                    max_duration = duration;
                    recovery_date = None;
                }

                drawdowns.push(drawdown);
            }
        }

        let avg_drawdown = if drawdowns.is_empty() {
            0.0
        } else {
            drawdowns.iter().sum::<f64>() / drawdowns.len() as f64
        };

        DrawdownAnalysis {
            max_drawdown,
            max_drawdown_date: (max_drawdown > 0.0).then_some(max_drawdown_date),
            peak_date: Some(max_peak_date),
            recovery_date,
            duration_days: max_duration,
            avg_drawdown,
            drawdown_periods: periods,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    const PNL: [f64; 5] = [100.0, -50.0, 0.0, 200.0, -20.0];

    #[test]
    fn test_statistics_end_to_end() {
        let stats = MetricsCalculator::pnl_statistics(&PNL, 0.004, 0.05).unwrap();

        assert_eq!(stats.pnl_distribution_by_trades, vec![100.0, -50.0, 200.0, -20.0]);
        assert_eq!(stats.trades, 4);
        assert_relative_eq!(stats.pnl_total, 230.0);
        assert_relative_eq!(stats.mean, 57.5);
        assert_relative_eq!(stats.std, 99.59292143521044, epsilon = 1e-9);
        assert_relative_eq!(stats.t_statistic.unwrap(), 1.1547005383792517, epsilon = 1e-9);
        assert_relative_eq!(stats.p_value.unwrap(), 0.1659207030272516, epsilon = 1e-7);
        assert_relative_eq!(stats.sharpe_ratio.unwrap(), 0.5773101056926387, epsilon = 1e-9);
        assert!(!stats.is_significant);

        assert_eq!(stats.winning_trades, 2);
        assert_relative_eq!(stats.profit_factor, 300.0 / 70.0);
        assert_eq!(stats.largest_winner, 200.0);
        assert_eq!(stats.largest_loser, -50.0);
    }

    #[test]
    fn test_significance_flag() {
        let strong = [10.0, 11.0, 9.0, 10.5, 9.5, 10.2, 9.8, 10.1];
        let stats = MetricsCalculator::pnl_statistics(&strong, 0.0, 0.05).unwrap();
        assert!(stats.p_value.unwrap() < 0.001);
        assert!(stats.is_significant);
    }

    #[test]
    fn test_no_trades_is_the_only_error() {
        assert_eq!(
            MetricsCalculator::pnl_statistics(&[], 0.0, 0.05).unwrap_err(),
            MetricsError::NoTrades
        );
        assert_eq!(
            MetricsCalculator::pnl_statistics(&[0.0, 0.0], 0.0, 0.05).unwrap_err(),
            MetricsError::NoTrades
        );
    }

    #[test]
    fn test_single_trade_keeps_distribution() {
        let stats = MetricsCalculator::pnl_statistics(&[0.0, 120.0, 0.0], 0.0, 0.05).unwrap();
        assert_eq!(stats.trades, 1);
        assert_eq!(stats.pnl_distribution_by_trades, vec![120.0]);
        assert_relative_eq!(stats.pnl_total, 120.0);
        assert_relative_eq!(stats.mean, 120.0);
        assert_eq!(stats.std, 0.0);
        assert_eq!(stats.sharpe_ratio, None);
        assert_eq!(stats.t_statistic, None);
        assert_eq!(stats.p_value, None);
        assert!(!stats.is_significant);
        assert!(stats.summary().contains("t-statistic: n/a"));
    }

    #[test]
    fn test_constant_pnl_keeps_distribution() {
        let stats = MetricsCalculator::pnl_statistics(&[50.0, 50.0], 0.0, 0.05).unwrap();
        assert_eq!(stats.trades, 2);
        assert_relative_eq!(stats.pnl_total, 100.0);
        assert_relative_eq!(stats.mean, 50.0);
        assert_eq!(stats.std, 0.0);
        assert_eq!(stats.sharpe_ratio, None);
        assert_eq!(stats.p_value, None);
        assert!(!stats.is_significant);
    }

    #[test]
    fn test_t_test_preconditions() {
        assert_eq!(MetricsCalculator::t_test(&[]).unwrap_err(), MetricsError::NoTrades);
        assert_eq!(
            MetricsCalculator::t_test(&[5.0]).unwrap_err(),
            MetricsError::InsufficientTrades(1)
        );
        assert_eq!(
            MetricsCalculator::t_test(&[5.0, 5.0, 5.0]).unwrap_err(),
            MetricsError::ZeroVariance
        );
    }

    #[test]
    fn test_cumulative() {
        assert_eq!(
            MetricsCalculator::cumulative(&PNL),
            vec![100.0, 50.0, 50.0, 250.0, 230.0]
        );
    }

    #[test]
    fn test_drawdown_analysis() {
        let start = NaiveDate::from_ymd_opt(2022, 4, 4).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let curve: Vec<(NaiveDateTime, f64)> = MetricsCalculator::cumulative(&PNL)
            .into_iter()
            .enumerate()
            .map(|(i, v)| (start + Duration::days(i as i64), v))
            .collect();

        let analysis = MetricsCalculator::analyze_drawdown(&curve);
        assert_eq!(analysis.max_drawdown, 50.0);
        assert_eq!(analysis.peak_date, Some(start));
        assert_eq!(analysis.max_drawdown_date, Some(start + Duration::days(1)));
        assert_eq!(analysis.recovery_date, Some(start + Duration::days(3)));
        assert_eq!(analysis.duration_days, 0);
        assert_eq!(analysis.drawdown_periods, 1);
        assert_relative_eq!(analysis.avg_drawdown, (50.0 + 50.0 + 20.0) / 3.0);
    }

    #[test]
    fn test_drawdown_analysis_empty() {
        let analysis = MetricsCalculator::analyze_drawdown(&[]);
        assert_eq!(analysis.max_drawdown, 0.0);
        assert_eq!(analysis.max_drawdown_date, None);
    }
}
