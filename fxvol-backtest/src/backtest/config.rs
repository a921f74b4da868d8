//! Backtest configuration.
//!
//! Static economics of a run live in `BacktestConfig` and load from TOML;
//! the per-run knobs (`days_strategy`, fixed vs rolling vol, decision
//! threshold) are `RunParameters`.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::MarketSide;
use crate::hedging::{HedgeParameters, SpreadModel};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for backtest execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Instrument being traded (e.g. "USDRUB").
    pub asset: String,

    /// Label of the onshore quote source.
    pub onshore_source: String,

    /// Label of the offshore quote source.
    pub offshore_source: String,

    /// First timestamp of the backtest period.
    pub start: NaiveDateTime,

    /// End of the backtest period.
    pub end: NaiveDateTime,

    /// Option notional in units of the base currency.
    pub notional: Decimal,

    /// Base currency risk-free rate (decimal). Also the Sharpe hurdle.
    pub rf_base_ccy: f64,

    /// Second currency risk-free rate (decimal).
    pub rf_second_ccy: f64,

    /// Sampling interval of the price series in seconds.
    pub delta_seconds: i64,

    /// p-value threshold of the PnL t-test.
    #[serde(default = "default_significance")]
    pub significance: f64,

    /// Hedge trade spreads.
    #[serde(default)]
    pub spread: SpreadModel,
}

fn default_significance() -> f64 {
    0.05
}

fn midnight(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            asset: "USDRUB".to_string(),
            onshore_source: "onshore".to_string(),
            offshore_source: "offshore".to_string(),
            start: midnight(2022, 4, 1),
            end: midnight(2022, 10, 1),
            notional: Decimal::from(1_000_000),
            rf_base_ccy: 0.004,
            rf_second_ccy: 0.025,
            delta_seconds: 3600,
            significance: default_significance(),
            spread: SpreadModel::default(),
        }
    }
}

impl BacktestConfig {
    pub fn with_period(mut self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_notional(mut self, notional: Decimal) -> Self {
        self.notional = notional;
        self
    }

    pub fn with_rates(mut self, rf_base_ccy: f64, rf_second_ccy: f64) -> Self {
        self.rf_base_ccy = rf_base_ccy;
        self.rf_second_ccy = rf_second_ccy;
        self
    }

    pub fn with_spread(mut self, spread: SpreadModel) -> Self {
        self.spread = spread;
        self
    }

    pub fn with_delta_seconds(mut self, delta_seconds: i64) -> Self {
        self.delta_seconds = delta_seconds;
        self
    }

    /// Load and validate a config from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate a config from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check the period, notional, sampling interval and test level.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start >= self.end {
            return Err(ConfigError::Invalid(format!(
                "start {} must be before end {}",
                self.start, self.end
            )));
        }
        if self.notional <= Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "notional must be positive, got {}",
                self.notional
            )));
        }
        if self.delta_seconds <= 0 {
            return Err(ConfigError::Invalid(format!(
                "delta_seconds must be positive, got {}",
                self.delta_seconds
            )));
        }
        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "significance must be in (0, 1), got {}",
                self.significance
            )));
        }
        if self.spread.onshore < Decimal::ZERO || self.spread.offshore < Decimal::ZERO {
            return Err(ConfigError::Invalid("spreads must be non-negative".to_string()));
        }
        Ok(())
    }

    /// Second currency rate minus base currency rate.
    pub fn rate_differential(&self) -> f64 {
        self.rf_second_ccy - self.rf_base_ccy
    }

    /// Calendar days in the backtest period.
    pub fn total_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Hedge economics for replicating on `side`.
    pub fn hedge_parameters(&self, side: MarketSide) -> Result<HedgeParameters, ConfigError> {
        let notional = self
            .notional
            .to_f64()
            .ok_or_else(|| ConfigError::Invalid(format!("notional {} is not representable", self.notional)))?;
        let spread = self.spread.rate_for(side).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "{} spread {} is not a usable rate",
                side.as_str(),
                self.spread.for_side(side)
            ))
        })?;
        Ok(HedgeParameters {
            notional,
            spread,
            rate_differential: self.rate_differential(),
            delta_seconds: self.delta_seconds,
        })
    }
}

/// Arguments of one backtest run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    /// Option life in calendar days; also the window length.
    pub days_strategy: u32,
    /// Hedge with the pre-window realized vol instead of a rolling one.
    pub use_fixed_vol: bool,
    /// Minimum |offshore vol - onshore vol| that triggers a trade.
    pub vol_diff_significance: f64,
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            days_strategy: 10,
            use_fixed_vol: false,
            vol_diff_significance: 0.0,
        }
    }
}

impl RunParameters {
    pub fn new(days_strategy: u32) -> Self {
        Self {
            days_strategy,
            ..Default::default()
        }
    }

    pub fn with_fixed_vol(mut self, use_fixed_vol: bool) -> Self {
        self.use_fixed_vol = use_fixed_vol;
        self
    }

    pub fn with_vol_diff_significance(mut self, threshold: f64) -> Self {
        self.vol_diff_significance = threshold;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.days_strategy == 0 {
            return Err(ConfigError::Invalid("days_strategy must be at least 1".to_string()));
        }
        if !(self.vol_diff_significance >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "vol_diff_significance must be non-negative, got {}",
                self.vol_diff_significance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = BacktestConfig::default();
        assert_eq!(config.notional, dec!(1000000));
        assert_eq!(config.spread.onshore, dec!(0.002));
        assert_eq!(config.total_days(), 183);
        assert!((config.rate_differential() - 0.021).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = BacktestConfig::default()
            .with_notional(dec!(250000))
            .with_spread(SpreadModel::new(dec!(0.001)).side_specific(true));
        let text = config.to_toml_string().unwrap();
        let parsed = BacktestConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let text = r#"
            asset = "USDCNH"
            onshore_source = "cfets"
            offshore_source = "hk"
            start = "2022-01-03T00:00:00"
            end = "2022-03-01T00:00:00"
            notional = "500000"
            rf_base_ccy = 0.02
            rf_second_ccy = 0.03
            delta_seconds = 3600
        "#;
        let config = BacktestConfig::from_toml_str(text).unwrap();
        assert_eq!(config.asset, "USDCNH");
        assert_eq!(config.notional, dec!(500000));
        assert_eq!(config.significance, 0.05);
        assert_eq!(config.spread, SpreadModel::default());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let base = BacktestConfig::default();

        let reversed = base.clone().with_period(base.end, base.start);
        assert!(matches!(reversed.validate(), Err(ConfigError::Invalid(_))));

        assert!(base.clone().with_notional(dec!(0)).validate().is_err());
        assert!(base.clone().with_delta_seconds(0).validate().is_err());

        assert!(RunParameters::new(0).validate().is_err());
        assert!(RunParameters::new(5).with_vol_diff_significance(-0.01).validate().is_err());
        assert!(RunParameters::new(5).validate().is_ok());
    }

    #[test]
    fn test_hedge_parameters_per_side() {
        let config = BacktestConfig::default();
        let onshore = config.hedge_parameters(MarketSide::Onshore).unwrap();
        let offshore = config.hedge_parameters(MarketSide::Offshore).unwrap();
        assert_eq!(onshore.notional, 1_000_000.0);
        assert_eq!(onshore.spread, offshore.spread);

        let specific = config.with_spread(SpreadModel::default().side_specific(true));
        let offshore = specific.hedge_parameters(MarketSide::Offshore).unwrap();
        assert!((offshore.spread - 0.0005).abs() < 1e-15);
    }

    #[test]
    fn test_hedge_parameters_reject_unusable_spread() {
        let config = BacktestConfig::default().with_spread(SpreadModel::new(dec!(-0.002)));
        assert!(matches!(
            config.hedge_parameters(MarketSide::Onshore),
            Err(ConfigError::Invalid(_))
        ));

        // Only the side actually charged is checked.
        let specific = SpreadModel {
            offshore: dec!(-0.001),
            ..SpreadModel::default()
        };
        let config = BacktestConfig::default().with_spread(specific.clone());
        assert!(config.hedge_parameters(MarketSide::Offshore).is_ok());
        let config = config.with_spread(specific.side_specific(true));
        assert!(matches!(
            config.hedge_parameters(MarketSide::Offshore),
            Err(ConfigError::Invalid(_))
        ));
    }
}
