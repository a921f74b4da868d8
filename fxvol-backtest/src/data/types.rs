//! Core data types for the onshore/offshore backtester.
//!
//! Price and return series are fully materialized in memory before a run and
//! are never mutated by the simulation. Both are kept sorted by timestamp so
//! window lookups are binary searches.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::standardize::Granularity;

/// Which market a series (or a leg of the trade) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketSide {
    Onshore,
    Offshore,
}

impl MarketSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Onshore => "onshore",
            Self::Offshore => "offshore",
        }
    }
}

/// A single observed price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: NaiveDateTime,
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp: NaiveDateTime, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// Ordered sequence of prices for one (asset, source).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series, sorting by timestamp.
    ///
    /// The sort is stable: points sharing a timestamp keep their source order.
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        Self { points }
    }

    /// Build from `(timestamp, price)` tuples.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDateTime, f64)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(timestamp, price)| PricePoint::new(timestamp, price))
                .collect(),
        )
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Floor every timestamp to the granularity and re-sort.
    ///
    /// Points collapsing onto the same rounded timestamp are all kept, in
    /// their original order.
    pub fn standardized(&self, granularity: Granularity) -> Self {
        Self::new(
            self.points
                .iter()
                .map(|p| PricePoint::new(granularity.floor(p.timestamp), p.price))
                .collect(),
        )
    }

    /// Calendar dates with at least one observation.
    pub fn available_days(&self) -> BTreeSet<NaiveDate> {
        self.points.iter().map(|p| p.timestamp.date()).collect()
    }

    /// Points with `start <= timestamp <= end`.
    pub fn slice(&self, start: NaiveDateTime, end: NaiveDateTime) -> &[PricePoint] {
        let lo = self.points.partition_point(|p| p.timestamp < start);
        let hi = self.points.partition_point(|p| p.timestamp <= end);
        if lo >= hi {
            return &[];
        }
        &self.points[lo..hi]
    }

    /// Keep every j-th point, where j is the index of the first point at least
    /// `delta_seconds` after the first observation.
    ///
    /// Thins tick-level data down to roughly one point per sampling interval.
    pub fn resample(&self, delta_seconds: i64) -> Self {
        let step = match sampling_stride(&self.points, delta_seconds) {
            Some((step, _)) => step,
            None => return self.clone(),
        };

        let points = (0..self.points.len() - step)
            .step_by(step)
            .map(|i| self.points[i])
            .collect();

        Self { points }
    }
}

/// Index stride and elapsed seconds of the first point at least
/// `delta_seconds` away from the start of the series.
///
/// Falls back to the last point when no observation is far enough away.
pub(crate) fn sampling_stride(points: &[PricePoint], delta_seconds: i64) -> Option<(usize, i64)> {
    if points.len() < 2 {
        return None;
    }
    let origin = points[0].timestamp;

    let mut stride = points.len() - 1;
    for (idx, point) in points.iter().enumerate() {
        if (point.timestamp - origin).num_seconds().abs() >= delta_seconds {
            stride = idx;
            break;
        }
    }

    if stride == 0 {
        return None;
    }
    let elapsed = (points[stride].timestamp - origin).num_seconds().abs();
    Some((stride, elapsed))
}

/// A single log-return, stamped at the end of its interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// Ordered log-returns for one (asset, source).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    points: Vec<ReturnPoint>,
}

impl ReturnSeries {
    pub fn new(mut points: Vec<ReturnPoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        Self { points }
    }

    /// Log-price differences over a stride of `delta_seconds`.
    ///
    /// Each return is normalized by how far the actual elapsed time of its
    /// interval deviates from the nominal stride, so gaps (overnight,
    /// weekends) do not inflate the per-interval variance.
    pub fn from_prices(prices: &PriceSeries, delta_seconds: i64) -> Self {
        let points = prices.points();
        let (step, nominal) = match sampling_stride(points, delta_seconds) {
            Some(found) if found.1 > 0 => found,
            _ => return Self::default(),
        };

        let returns = (0..points.len() - step)
            .step_by(step)
            .filter_map(|i| {
                let from = points[i];
                let to = points[i + step];
                let elapsed = (to.timestamp - from.timestamp).num_seconds().abs();
                if elapsed == 0 || from.price <= 0.0 || to.price <= 0.0 {
                    return None;
                }
                let adjustment = elapsed as f64 / nominal as f64;
                Some(ReturnPoint {
                    timestamp: to.timestamp,
                    value: (to.price.ln() - from.price.ln()) / adjustment,
                })
            })
            .collect();

        Self::new(returns)
    }

    pub fn points(&self) -> &[ReturnPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Return values stamped within `[start, end]`.
    pub fn window(&self, start: NaiveDateTime, end: NaiveDateTime) -> Vec<f64> {
        let lo = self.points.partition_point(|p| p.timestamp < start);
        let hi = self.points.partition_point(|p| p.timestamp <= end);
        if lo >= hi {
            return Vec::new();
        }
        self.points[lo..hi].iter().map(|p| p.value).collect()
    }
}

/// Cross rate `base / second` on timestamps present in both series.
pub fn synthetic_cross(base: &PriceSeries, second: &PriceSeries) -> PriceSeries {
    let second_prices: std::collections::HashMap<NaiveDateTime, f64> = second
        .points()
        .iter()
        .map(|p| (p.timestamp, p.price))
        .collect();

    PriceSeries::new(
        base.points()
            .iter()
            .filter_map(|p| {
                second_prices
                    .get(&p.timestamp)
                    .filter(|&&s| s != 0.0)
                    .map(|s| PricePoint::new(p.timestamp, p.price / s))
            })
            .collect(),
    )
}
