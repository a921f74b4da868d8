//! Trade window generation.
//!
//! One window starts on every calendar day `t` in `1..total_days - days_strategy`
//! after the period start, skipping both edges of the period. A paired window
//! is tradable only when both sources quote on its start date.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A single option life inside the backtest period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestWindow {
    /// Day offset from the period start.
    pub offset_days: i64,
    /// Option inception.
    pub start: NaiveDateTime,
    /// Option expiry.
    pub end: NaiveDateTime,
    /// Start of the pre-window realized vol lookback.
    pub lookback_start: NaiveDateTime,
}

impl BacktestWindow {
    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    /// Window length in days.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Whether a source with `days` available quotes on the start date.
    pub fn quotes_on(&self, days: &BTreeSet<NaiveDate>) -> bool {
        days.contains(&self.start_date())
    }

    /// Whether both sources have data on the start date.
    pub fn is_tradable(&self, onshore_days: &BTreeSet<NaiveDate>, offshore_days: &BTreeSet<NaiveDate>) -> bool {
        self.quotes_on(onshore_days) && self.quotes_on(offshore_days)
    }
}

/// Generator for trade windows.
pub struct BacktestWindows {
    start: NaiveDateTime,
    end: NaiveDateTime,
    days_strategy: i64,
}

impl BacktestWindows {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, days_strategy: u32) -> Self {
        Self {
            start,
            end,
            days_strategy: days_strategy as i64,
        }
    }

    /// Whole calendar days in the period.
    pub fn total_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Number of windows `generate` will return.
    pub fn expected_windows(&self) -> usize {
        (self.total_days() - self.days_strategy - 1).max(0) as usize
    }

    /// Generate all windows in chronological order.
    pub fn generate(&self) -> Vec<BacktestWindow> {
        let length = Duration::days(self.days_strategy);
        let lookback = Duration::days(self.days_strategy + 1);

        (1..self.total_days() - self.days_strategy)
            .map(|t| {
                let start = self.start + Duration::days(t);
                BacktestWindow {
                    offset_days: t,
                    start,
                    end: start + length,
                    lookback_start: start - lookback,
                }
            })
            .collect()
    }
}
