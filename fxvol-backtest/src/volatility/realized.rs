//! Realized volatility and covariance estimation.
//!
//! Annualization assumes 252 trading days of 9 hours each, so a series sampled
//! every `delta_seconds` has `252 * 9 * 3600 / delta_seconds` periods a year.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::data::ReturnSeries;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const TRADING_SECONDS_PER_DAY: f64 = 9.0 * 60.0 * 60.0;

/// Outcome of a volatility estimate.
///
/// `Unavailable` means there is no tradable signal at this point (too few
/// returns, zero or non-finite dispersion). It is never an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VolatilitySignal {
    Available(f64),
    Unavailable,
}

impl VolatilitySignal {
    /// Wrap a raw number, mapping zero, negative and non-finite values to
    /// `Unavailable`.
    pub fn from_value(value: f64) -> Self {
        if value.is_finite() && value > 0.0 {
            Self::Available(value)
        } else {
            Self::Unavailable
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Available(v) => Some(*v),
            Self::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// Annualized realized volatility for a fixed sampling interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RealizedVolEstimator {
    delta_seconds: i64,
}

impl RealizedVolEstimator {
    pub fn new(delta_seconds: i64) -> Self {
        Self { delta_seconds }
    }

    pub fn delta_seconds(&self) -> i64 {
        self.delta_seconds
    }

    pub fn periods_per_year(&self) -> f64 {
        TRADING_DAYS_PER_YEAR * TRADING_SECONDS_PER_DAY / self.delta_seconds as f64
    }

    /// `sqrt(periods_per_year) * population_std(returns)`.
    pub fn estimate(&self, returns: &[f64]) -> VolatilitySignal {
        if returns.len() < 2 {
            return VolatilitySignal::Unavailable;
        }
        let std = returns.iter().population_std_dev();
        VolatilitySignal::from_value(self.periods_per_year().sqrt() * std)
    }

    /// Estimate over the returns stamped in `[start, end]`.
    pub fn estimate_window(
        &self,
        returns: &ReturnSeries,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> VolatilitySignal {
        self.estimate(&returns.window(start, end))
    }

    /// Pearson correlation of two aligned return samples times both realized
    /// vols. `None` when the samples differ in length or either side carries
    /// no signal.
    pub fn realized_covariance(&self, a: &[f64], b: &[f64]) -> Option<f64> {
        if a.len() != b.len() {
            return None;
        }
        let vol_a = self.estimate(a).value()?;
        let vol_b = self.estimate(b).value()?;

        let covariance = a.iter().population_covariance(b.iter());
        let correlation = covariance / (a.iter().population_std_dev() * b.iter().population_std_dev());
        Some(correlation * vol_a * vol_b)
    }
}

/// Covariance of two assets implied by their vols and the vol of the asset
/// replicating their combination: `(vol_a^2 + vol_b^2 - vol_replicating^2) / 2`.
pub fn implied_covariance(vol_a: f64, vol_b: f64, vol_replicating: f64) -> f64 {
    (vol_a * vol_a + vol_b * vol_b - vol_replicating * vol_replicating) / 2.0
}

/// Side taken on a delta-neutral option strategy over two assets, against the
/// asset replicating their combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationTrade {
    Buy,
    Sell,
}

impl CorrelationTrade {
    /// Buy the strategy's implied variance `vol_a^2 + vol_b^2` when the
    /// replicating asset's covariance-adjusted variance
    /// `vol_replicating^2 + 2 * covariance_forecast` is at least as large.
    ///
    /// Equivalent to buying when the forecast covariance is at or above
    /// [`implied_covariance`].
    pub fn decide(vol_replicating: f64, implied_vol_a: f64, implied_vol_b: f64, covariance_forecast: f64) -> Self {
        let strategy_implied = implied_vol_a * implied_vol_a + implied_vol_b * implied_vol_b;
        let replication_realized = vol_replicating * vol_replicating + 2.0 * covariance_forecast;
        if replication_realized >= strategy_implied {
            Self::Buy
        } else {
            Self::Sell
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}
