//! Timestamp standardization.
//!
//! Raw quotes arrive with arbitrary sub-interval precision. Before windows are
//! cut, every timestamp is floored to the resolution implied by the sampling
//! interval:
//!
//! | delta_seconds      | Floor to     |
//! |--------------------|--------------|
//! | < 60               | second       |
//! | < 3 600            | minute       |
//! | < 43 200           | hour         |
//! | < 86 400           | day          |
//! | otherwise          | month start  |

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Resolution that timestamps are floored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Second,
    Minute,
    Hour,
    Day,
    Month,
}

impl Granularity {
    pub fn from_delta_seconds(delta_seconds: i64) -> Self {
        if delta_seconds < 60 {
            Self::Second
        } else if delta_seconds < 60 * 60 {
            Self::Minute
        } else if delta_seconds < 12 * 60 * 60 {
            Self::Hour
        } else if delta_seconds < 24 * 60 * 60 {
            Self::Day
        } else {
            Self::Month
        }
    }

    /// Floor a timestamp to this resolution.
    pub fn floor(&self, timestamp: NaiveDateTime) -> NaiveDateTime {
        let date = timestamp.date();
        let floored = match self {
            Self::Second => date.and_hms_opt(timestamp.hour(), timestamp.minute(), timestamp.second()),
            Self::Minute => date.and_hms_opt(timestamp.hour(), timestamp.minute(), 0),
            Self::Hour => date.and_hms_opt(timestamp.hour(), 0, 0),
            Self::Day => date.and_hms_opt(0, 0, 0),
            Self::Month => date.with_day(1).and_then(|d| d.and_hms_opt(0, 0, 0)),
        };
        floored.unwrap_or(timestamp)
    }
}
