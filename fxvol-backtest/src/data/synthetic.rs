//! Synthetic onshore/offshore price paths.
//!
//! Geometric Brownian motion with constant volatility per side and a common
//! shock correlation, sampled hourly over a weekday trading session. Used by
//! the CLI demo and by tests that need realistic-looking paths without any
//! external data.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use rand::distributions::Distribution;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;

use super::types::{PricePoint, PriceSeries};

/// First and last hourly fixing of the session (inclusive): nine points a day.
const SESSION_OPEN_HOUR: u32 = 10;
const SESSION_CLOSE_HOUR: u32 = 18;

/// Parameters of a synthetic onshore/offshore pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbmPairConfig {
    pub start: NaiveDate,
    /// Calendar days to generate.
    pub days: u32,
    pub spot: f64,
    /// Annualized drift of log-prices (rate differential).
    pub drift: f64,
    pub vol_onshore: f64,
    pub vol_offshore: f64,
    /// Correlation between onshore and offshore shocks.
    pub correlation: f64,
    /// Probability that a whole offshore trading day is missing.
    pub offshore_gap_probability: f64,
    pub seed: u64,
}

impl Default for GbmPairConfig {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2022, 4, 1).unwrap_or_default(),
            days: 183,
            spot: 75.0,
            drift: 0.021,
            vol_onshore: 0.12,
            vol_offshore: 0.15,
            correlation: 0.9,
            offshore_gap_probability: 0.02,
            seed: 42,
        }
    }
}

/// Generated pair of series.
#[derive(Debug, Clone)]
pub struct SyntheticPair {
    pub onshore: PriceSeries,
    pub offshore: PriceSeries,
}

/// Seeded GBM generator.
pub struct GbmPathGenerator {
    config: GbmPairConfig,
}

impl GbmPathGenerator {
    pub fn new(config: GbmPairConfig) -> Self {
        Self { config }
    }

    /// Session timestamps for every weekday in the configured range.
    pub fn session_timestamps(&self) -> Vec<NaiveDateTime> {
        (0..self.config.days as i64)
            .map(|d| self.config.start + Duration::days(d))
            .filter(|date| !matches!(date.weekday(), Weekday::Sat | Weekday::Sun))
            .flat_map(|date| {
                (SESSION_OPEN_HOUR..=SESSION_CLOSE_HOUR).filter_map(move |h| date.and_hms_opt(h, 0, 0))
            })
            .collect()
    }

    /// Generate both series.
    pub fn generate(&self) -> SyntheticPair {
        let cfg = &self.config;
        let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);
        let normal = Normal::new(0.0, 1.0).unwrap();

        let steps_per_year = 252.0 * (SESSION_CLOSE_HOUR - SESSION_OPEN_HOUR + 1) as f64;
        let dt = 1.0 / steps_per_year;
        let rho = cfg.correlation.clamp(-1.0, 1.0);
        let idiosyncratic = (1.0 - rho * rho).sqrt();

        let drift_on = (cfg.drift - 0.5 * cfg.vol_onshore.powi(2)) * dt;
        let drift_off = (cfg.drift - 0.5 * cfg.vol_offshore.powi(2)) * dt;

        let mut onshore = Vec::new();
        let mut offshore = Vec::new();
        let mut spot_on = cfg.spot;
        let mut spot_off = cfg.spot;
        let mut current_day: Option<NaiveDate> = None;
        let mut skip_offshore_day = false;

        for (idx, timestamp) in self.session_timestamps().into_iter().enumerate() {
            if current_day != Some(timestamp.date()) {
                current_day = Some(timestamp.date());
                skip_offshore_day = idx > 0 && rng.gen_bool(cfg.offshore_gap_probability.clamp(0.0, 1.0));
            }

            if idx > 0 {
                let z1 = normal.sample(&mut rng);
                let z2 = normal.sample(&mut rng);
                let z_off = rho * z1 + idiosyncratic * z2;
                spot_on *= (drift_on + cfg.vol_onshore * dt.sqrt() * z1).exp();
                spot_off *= (drift_off + cfg.vol_offshore * dt.sqrt() * z_off).exp();
            }

            onshore.push(PricePoint::new(timestamp, spot_on));
            if !skip_offshore_day {
                offshore.push(PricePoint::new(timestamp, spot_off));
            }
        }

        SyntheticPair {
            onshore: PriceSeries::new(onshore),
            offshore: PriceSeries::new(offshore),
        }
    }
}
