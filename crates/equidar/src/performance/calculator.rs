use super::axis::{Axis, AxisBinding};
use super::trend::Trend;
use super::ReportYears;
use crate::indicators::{IndicatorRecord, MetricValues};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearScore {
    pub year: i32,
    pub value: Option<f64>,
}

/// Per-axis result for one school and stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisPerformance {
    pub axis: Axis,
    pub axis_label: &'static str,
    /// One slot per report year; missing years stay in place as `None`.
    pub scores: Vec<YearScore>,
    pub latest: Option<f64>,
    pub trend: Trend,
    /// 0.0 when there is no observation; check `has_data` to tell the two apart.
    pub normalized_score: f64,
    pub has_data: bool,
}

impl AxisPerformance {
    pub fn compute(binding: &AxisBinding, history: &[&IndicatorRecord], years: &ReportYears) -> Self {
        let scores = metric_series(history, years, binding.metric);
        Self::from_scores(binding, scores)
    }

    pub fn from_scores(binding: &AxisBinding, scores: Vec<YearScore>) -> Self {
        let latest = latest_value(&scores);
        let trend = Trend::classify(scores.iter().map(|score| score.value));
        let normalized_score = latest
            .map(|value| binding.range.normalize(value))
            .unwrap_or(0.0);

        Self {
            axis: binding.axis,
            axis_label: binding.axis.label(),
            scores,
            latest,
            trend,
            normalized_score,
            has_data: latest.is_some(),
        }
    }
}

/// Reads one metric for every report year from records of a single stage.
/// Duplicate rows for a year resolve to the first non-null value.
pub fn metric_series(
    history: &[&IndicatorRecord],
    years: &ReportYears,
    metric: fn(&MetricValues) -> Option<f64>,
) -> Vec<YearScore> {
    years
        .iter()
        .map(|year| YearScore {
            year,
            value: history
                .iter()
                .filter(|record| record.year == Some(year))
                .find_map(|record| metric(&record.metrics)),
        })
        .collect()
}

pub fn latest_value(scores: &[YearScore]) -> Option<f64> {
    scores.iter().rev().find_map(|score| score.value)
}
