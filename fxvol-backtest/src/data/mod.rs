pub mod standardize;
pub mod synthetic;
pub mod types;

pub use standardize::Granularity;
pub use synthetic::{GbmPairConfig, GbmPathGenerator, SyntheticPair};
pub use types::{
    synthetic_cross, MarketSide, PricePoint, PriceSeries, ReturnPoint, ReturnSeries,
};
