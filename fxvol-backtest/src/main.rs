//! Onshore/offshore realized-volatility backtester CLI.
//!
//! # Usage
//!
//! ```bash
//! # Backtest on synthetic correlated paths with default settings
//! fxvol-backtest synthetic
//!
//! # Custom config, window lengths and vols
//! fxvol-backtest synthetic --config config.toml --days 5,10 --vol-onshore 0.1 --vol-offshore 0.18
//!
//! # Net delta-hedge PnL of the onshore source alone
//! fxvol-backtest synthetic --single-side onshore
//!
//! # Print the default configuration
//! fxvol-backtest default-config > config.toml
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use fxvol_backtest::backtest::{BacktestConfig, BacktestEngine, MarketData, RunParameters};
use fxvol_backtest::data::{GbmPairConfig, GbmPathGenerator, MarketSide};
use fxvol_backtest::hedging::{DynamicDeltaHedge, FixedLevelHedge, HedgingStrategy};

#[derive(Parser)]
#[command(name = "fxvol-backtest")]
#[command(about = "Onshore vs offshore realized-volatility arbitrage backtester")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    /// Black-Scholes delta rebalancing
    Dynamic,
    /// Full hedge above the strike, flat below
    FixedLevel,
}

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    Onshore,
    Offshore,
}

impl From<Side> for MarketSide {
    fn from(side: Side) -> Self {
        match side {
            Side::Onshore => MarketSide::Onshore,
            Side::Offshore => MarketSide::Offshore,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest on generated onshore/offshore paths
    Synthetic {
        /// Path to a TOML configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Window lengths in calendar days
        #[arg(short, long, value_delimiter = ',', default_value = "5,10,20,30")]
        days: Vec<u32>,

        /// Hedging strategy
        #[arg(long, value_enum, default_value = "dynamic")]
        strategy: Strategy,

        /// Hedge with the pre-window vol instead of a rolling one
        #[arg(long)]
        fixed_vol: bool,

        /// Minimum |offshore - onshore| vol difference to trade
        #[arg(long, default_value_t = 0.0)]
        threshold: f64,

        /// Replicate on one source only and report its net hedge PnL
        #[arg(long, value_enum)]
        single_side: Option<Side>,

        /// Annualized onshore vol of the generated path
        #[arg(long, default_value_t = 0.12)]
        vol_onshore: f64,

        /// Annualized offshore vol of the generated path
        #[arg(long, default_value_t = 0.15)]
        vol_offshore: f64,

        /// Correlation of onshore and offshore shocks
        #[arg(long, default_value_t = 0.9)]
        correlation: f64,

        /// Probability of a missing offshore day
        #[arg(long, default_value_t = 0.02)]
        gap_probability: f64,

        /// RNG seed
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the default configuration as TOML
    DefaultConfig,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fxvol_backtest=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Synthetic {
            config,
            days,
            strategy,
            fixed_vol,
            threshold,
            single_side,
            vol_onshore,
            vol_offshore,
            correlation,
            gap_probability,
            seed,
            json,
        } => {
            let config = match config {
                Some(path) => BacktestConfig::from_toml_file(&path)
                    .with_context(|| format!("Failed to load config from {}", path))?,
                None => BacktestConfig::default(),
            };

            let gbm = GbmPairConfig {
                start: config.start.date(),
                days: config.total_days().max(0) as u32,
                vol_onshore,
                vol_offshore,
                correlation,
                offshore_gap_probability: gap_probability,
                seed,
                ..Default::default()
            };
            info!(
                "Generating {} days of {} paths (vols {:.3}/{:.3}, seed {})",
                gbm.days, config.asset, vol_onshore, vol_offshore, seed
            );
            let pair = GbmPathGenerator::new(gbm).generate();
            let data = MarketData::from_raw_prices(&pair.onshore, &pair.offshore, config.delta_seconds);

            let runs: Vec<RunParameters> = days
                .iter()
                .map(|&d| {
                    RunParameters::new(d)
                        .with_fixed_vol(fixed_vol)
                        .with_vol_diff_significance(threshold)
                })
                .collect();

            let side = single_side.map(MarketSide::from);
            match strategy {
                Strategy::Dynamic => sweep(config, DynamicDeltaHedge, &data, &runs, side, json),
                Strategy::FixedLevel => sweep(config, FixedLevelHedge, &data, &runs, side, json),
            }
        }

        Commands::DefaultConfig => {
            let text = BacktestConfig::default()
                .to_toml_string()
                .context("Failed to serialize default config")?;
            println!("{}", text);
            Ok(())
        }
    }
}

fn sweep<S: HedgingStrategy>(
    config: BacktestConfig,
    strategy: S,
    data: &MarketData,
    runs: &[RunParameters],
    single_side: Option<MarketSide>,
    json: bool,
) -> Result<()> {
    let engine = BacktestEngine::new(config, strategy).context("Invalid backtest configuration")?;

    let pb = ProgressBar::new(runs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let mut reports = Vec::new();
    for run in runs {
        pb.set_message(format!("{} days", run.days_strategy));
        let result = match single_side {
            Some(side) => engine.run_single_side(data, side, run),
            None => engine.run_backtest(data, run),
        }
        .with_context(|| format!("Backtest failed for {} days", run.days_strategy))?;
        reports.push((run.days_strategy, result));
        pb.inc(1);
    }
    pb.finish_with_message("sweep complete");

    for (days, result) in &reports {
        if json {
            let stats = result.statistics().ok();
            let value = serde_json::json!({
                "days_strategy": days,
                "mode": result.mode,
                "diagnostics": result.diagnostics,
                "statistics": stats,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else {
            println!("\n{}", result.summary());
        }
    }

    Ok(())
}
