//! Axis Performance Calculator: per-axis series, trend and normalized score.

pub mod axis;
mod calculator;
mod trend;

use serde::Serialize;
use std::fmt;

pub use axis::{Axis, AxisBinding, NormalizationRange, AXIS_BINDINGS, COMPOSITE_INDEX_RANGE};
pub use calculator::{latest_value, metric_series, AxisPerformance, YearScore};
pub use trend::{Trend, TREND_THRESHOLD};

/// Ordered year slots every series is laid out on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportYears(Vec<i32>);

impl ReportYears {
    pub fn new(years: Vec<i32>) -> Result<Self, InvalidReportYears> {
        if years.is_empty() {
            return Err(InvalidReportYears::Empty);
        }
        if years.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(InvalidReportYears::NotIncreasing(years));
        }
        Ok(Self(years))
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.iter().copied()
    }

    pub fn latest(&self) -> i32 {
        self.0[self.0.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ReportYears {
    fn default() -> Self {
        Self(vec![2017, 2019, 2021])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReportYears {
    Empty,
    NotIncreasing(Vec<i32>),
}

impl fmt::Display for InvalidReportYears {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReportYears::Empty => write!(f, "at least one report year is required"),
            InvalidReportYears::NotIncreasing(years) => {
                write!(f, "report years must be strictly increasing, got {years:?}")
            }
        }
    }
}

impl std::error::Error for InvalidReportYears {}
