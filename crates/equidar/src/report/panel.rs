use crate::indicators::{IndicatorRecord, Stage};
use serde::Serialize;
use std::collections::BTreeMap;

/// Observed composite index of one school, keyed by stage then year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchoolCompositePanel {
    pub school_id: String,
    pub school_name: String,
    pub composite: BTreeMap<Stage, BTreeMap<i32, Option<f64>>>,
}

impl SchoolCompositePanel {
    /// Mean of each stage's mean over its observed years, then the mean
    /// across stages that have any observation.
    pub fn mean_composite(&self) -> Option<f64> {
        let stage_means: Vec<f64> = self
            .composite
            .values()
            .filter_map(|years| mean(years.values().flatten().copied()))
            .collect();
        mean(stage_means.into_iter())
    }
}

/// Groups records by school; rows without a year are skipped.
pub fn composite_panel(records: &[&IndicatorRecord]) -> Vec<SchoolCompositePanel> {
    let mut grouped: BTreeMap<(&str, &str), BTreeMap<Stage, BTreeMap<i32, Option<f64>>>> =
        BTreeMap::new();

    for record in records {
        let Some(year) = record.year else {
            continue;
        };
        let slot = grouped
            .entry((record.school_id.as_str(), record.school_name.as_str()))
            .or_default()
            .entry(record.stage)
            .or_default()
            .entry(year)
            .or_insert(None);
        if slot.is_none() {
            *slot = record.metrics.composite_index;
        }
    }

    grouped
        .into_iter()
        .map(|((school_id, school_name), composite)| SchoolCompositePanel {
            school_id: school_id.to_string(),
            school_name: school_name.to_string(),
            composite,
        })
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    (count > 0).then(|| sum / count as f64)
}
