use super::school::{build_school_report, default_stage};
use super::views::{
    Classification, ClassificationCount, MunicipalAverages, MunicipalityReport, SchoolReport,
};
use crate::indicators::{IndicatorRecord, MetricValues, School};
use crate::performance::{ReportYears, COMPOSITE_INDEX_RANGE};
use crate::store::IndicatorStore;
use crate::upgrades::{Impact, UpgradePoint};
use tracing::debug;

pub const MAX_MUNICIPAL_PRIORITIES: usize = 10;

/// Rolls the given schools into one municipality report. `None` when there
/// are no schools to aggregate.
pub fn build_municipality_report(
    schools: &[&School],
    store: &IndicatorStore,
    years: &ReportYears,
) -> Option<MunicipalityReport> {
    let first = schools.first()?;

    let mut latest_records: Vec<&IndicatorRecord> = Vec::new();
    let mut reports: Vec<SchoolReport> = Vec::with_capacity(schools.len());
    for school in schools {
        let history = store.records_by_school(&school.id);
        latest_records.extend(
            history
                .iter()
                .copied()
                .filter(|record| record.year == Some(years.latest())),
        );
        if let Some(stage) = default_stage(&history) {
            reports.push(build_school_report(school, &history, stage, years));
        }
    }

    let averages = municipal_averages(&latest_records, years.latest());
    let classification_histogram = histogram(&reports);
    let priorities = consolidate_priorities(&reports, schools.len());
    let municipal_score = averages
        .composite_index
        .map(|value| COMPOSITE_INDEX_RANGE.normalize(value))
        .unwrap_or(0.0);

    debug!(
        municipality = %first.municipality,
        schools = schools.len(),
        municipal_score,
        "municipality report built"
    );

    Some(MunicipalityReport {
        municipality_code: first.municipality_code.clone(),
        municipality_name: first.municipality.clone(),
        total_schools: schools.len(),
        averages,
        classification_histogram,
        priorities,
        municipal_score,
        has_data: averages.composite_index.is_some(),
    })
}

fn municipal_averages(records: &[&IndicatorRecord], year: i32) -> MunicipalAverages {
    let average = |metric: fn(&MetricValues) -> Option<f64>| {
        let values: Vec<f64> = records
            .iter()
            .filter_map(|record| metric(&record.metrics))
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    };

    MunicipalAverages {
        year,
        composite_index: average(|metrics| metrics.composite_index),
        mathematics: average(|metrics| metrics.math_score),
        language: average(|metrics| metrics.language_score),
        approval_rate: average(|metrics| metrics.approval_rate),
    }
}

fn histogram(reports: &[SchoolReport]) -> Vec<ClassificationCount> {
    Classification::ordered()
        .into_iter()
        .map(|classification| ClassificationCount {
            classification,
            label: classification.label(),
            schools: reports
                .iter()
                .filter(|report| report.classification == classification)
                .count(),
        })
        .collect()
}

/// Groups every school's points by area, most shared first. Ties keep the
/// order in which the area was first encountered.
fn consolidate_priorities(reports: &[SchoolReport], total_schools: usize) -> Vec<UpgradePoint> {
    let mut groups: Vec<(&'static str, Vec<&UpgradePoint>)> = Vec::new();
    for point in reports.iter().flat_map(|report| &report.upgrade_points) {
        match groups.iter_mut().find(|(area, _)| *area == point.area) {
            Some((_, members)) => members.push(point),
            None => groups.push((point.area, vec![point])),
        }
    }

    groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
    groups.truncate(MAX_MUNICIPAL_PRIORITIES);

    groups
        .into_iter()
        .filter_map(|(area, members)| {
            let affected = members.len();
            let priority = members.iter().map(|point| point.priority).min()?;
            let current_score =
                members.iter().map(|point| point.current_score).sum::<f64>() / affected as f64;
            let target_score =
                members.iter().map(|point| point.target_score).sum::<f64>() / affected as f64;
            let impact = if affected * 2 > total_schools {
                Impact::High
            } else {
                Impact::Medium
            };

            Some(UpgradePoint {
                area,
                description: format!(
                    "{affected} of {total_schools} school{} share this issue: {area}",
                    if total_schools == 1 { "" } else { "s" }
                ),
                priority,
                current_score,
                target_score,
                impact,
            })
        })
        .collect()
}
