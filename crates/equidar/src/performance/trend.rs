use serde::Serialize;

/// Absolute difference between the first and last observation that counts as
/// movement, on every axis regardless of its scale.
pub const TREND_THRESHOLD: f64 = 0.1;

/// Float noise allowance so a nominal 0.1 step (e.g. 0.80 -> 0.90) registers.
const THRESHOLD_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

impl Trend {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Declining => "declining",
            Self::Stable => "stable",
        }
    }

    /// Two-point comparison of the first and last non-null values.
    pub fn classify<I>(series: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let mut observed = series.into_iter().flatten();
        let Some(first) = observed.next() else {
            return Self::Stable;
        };
        let Some(last) = observed.last() else {
            return Self::Stable;
        };

        let delta = last - first;
        if delta > TREND_THRESHOLD - THRESHOLD_TOLERANCE {
            Self::Improving
        } else if delta < -(TREND_THRESHOLD - THRESHOLD_TOLERANCE) {
            Self::Declining
        } else {
            Self::Stable
        }
    }
}
