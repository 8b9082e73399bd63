use crate::indicators::MetricValues;
use serde::Serialize;

/// One analytical dimension tracked per school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    ApprovalRate,
    Mathematics,
    Language,
    CompositeIndex,
}

impl Axis {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::ApprovalRate,
            Self::Mathematics,
            Self::Language,
            Self::CompositeIndex,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ApprovalRate => "Approval Rate",
            Self::Mathematics => "Mathematics",
            Self::Language => "Language",
            Self::CompositeIndex => "Composite Index",
        }
    }

    /// Table entries follow declaration order.
    pub fn binding(self) -> &'static AxisBinding {
        &AXIS_BINDINGS[self as usize]
    }
}

/// Fixed scale of an axis. Never derived from observed data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizationRange {
    pub min: f64,
    pub max: f64,
}

impl NormalizationRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Linear 0-100 rescale. Values outside the range are not clamped.
    pub fn normalize(&self, value: f64) -> f64 {
        (value - self.min) / (self.max - self.min) * 100.0
    }
}

/// Axis to (metric accessor, range) entry.
#[derive(Debug, Clone, Copy)]
pub struct AxisBinding {
    pub axis: Axis,
    pub metric: fn(&MetricValues) -> Option<f64>,
    pub range: NormalizationRange,
}

pub const COMPOSITE_INDEX_RANGE: NormalizationRange = NormalizationRange::new(0.0, 10.0);

pub static AXIS_BINDINGS: [AxisBinding; 4] = [
    AxisBinding {
        axis: Axis::ApprovalRate,
        metric: |metrics| metrics.approval_rate,
        range: NormalizationRange::new(0.0, 1.0),
    },
    AxisBinding {
        axis: Axis::Mathematics,
        metric: |metrics| metrics.math_score,
        range: NormalizationRange::new(150.0, 300.0),
    },
    AxisBinding {
        axis: Axis::Language,
        metric: |metrics| metrics.language_score,
        range: NormalizationRange::new(150.0, 300.0),
    },
    AxisBinding {
        axis: Axis::CompositeIndex,
        metric: |metrics| metrics.composite_index,
        range: COMPOSITE_INDEX_RANGE,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_axis_has_its_own_binding() {
        for axis in Axis::ordered() {
            assert_eq!(axis.binding().axis, axis);
        }
    }

    #[test]
    fn mathematics_midpoint_is_fifty() {
        let range = Axis::Mathematics.binding().range;
        assert_eq!(range.normalize(225.0), 50.0);
    }

    #[test]
    fn out_of_range_values_are_not_clamped() {
        let range = Axis::Mathematics.binding().range;
        assert!(range.normalize(310.0) > 100.0);
        assert!(range.normalize(120.0) < 0.0);
    }

    #[test]
    fn bindings_read_the_matching_metric() {
        let metrics = MetricValues {
            approval_rate: Some(0.9),
            math_score: Some(210.0),
            language_score: Some(190.0),
            composite_index: Some(5.5),
            ..MetricValues::default()
        };
        let read: Vec<Option<f64>> = Axis::ordered()
            .into_iter()
            .map(|axis| (axis.binding().metric)(&metrics))
            .collect();
        assert_eq!(read, vec![Some(0.9), Some(210.0), Some(190.0), Some(5.5)]);
    }
}
