pub mod backtest;
pub mod data;
pub mod hedging;
pub mod metrics;
pub mod pricing;
pub mod volatility;

// Re-export commonly used types
pub use backtest::{
    BacktestConfig, BacktestEngine, BacktestError, BacktestMode, BacktestResult, MarketData, RunParameters,
    TradeDirection,
};
pub use data::{GbmPairConfig, GbmPathGenerator, MarketSide, PricePoint, PriceSeries, ReturnSeries};
pub use hedging::{DynamicDeltaHedge, FixedLevelHedge, HedgingStrategy, SpreadModel};
pub use metrics::{MetricsCalculator, MetricsError, PnlStatistics};
pub use pricing::{CompositeOption, OptionKind, OptionParams, Pricing, PricingError, VanillaOption};
pub use volatility::{RealizedVolEstimator, VolatilitySignal};
