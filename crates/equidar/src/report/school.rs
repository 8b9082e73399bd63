use super::views::{Classification, CompositeIndexSummary, SchoolReport};
use crate::indicators::{IndicatorRecord, School, Stage};
use crate::performance::{metric_series, Axis, AxisPerformance, ReportYears, Trend};
use crate::upgrades::{self, GoalComparison};
use tracing::debug;

/// First stage, in canonical order, where the school has any metric value;
/// falls back to the first stage with any row at all.
pub fn default_stage(history: &[&IndicatorRecord]) -> Option<Stage> {
    let with_data = Stage::ordered().into_iter().find(|stage| {
        history
            .iter()
            .any(|record| record.stage == *stage && !record.metrics.is_empty())
    });
    with_data.or_else(|| {
        Stage::ordered()
            .into_iter()
            .find(|stage| history.iter().any(|record| record.stage == *stage))
    })
}

pub fn build_school_report(
    school: &School,
    history: &[&IndicatorRecord],
    stage: Stage,
    years: &ReportYears,
) -> SchoolReport {
    let stage_history: Vec<&IndicatorRecord> = history
        .iter()
        .copied()
        .filter(|record| record.stage == stage)
        .collect();

    let axes: Vec<AxisPerformance> = Axis::ordered()
        .into_iter()
        .map(|axis| AxisPerformance::compute(axis.binding(), &stage_history, years))
        .collect();

    let composite_index = composite_summary(&stage_history, years);
    let goal = GoalComparison {
        observed: composite_index.observed_in_goal_year,
        projected: composite_index.goal,
    };
    let upgrade_points = upgrades::synthesize(&axes, goal);

    let overall_score =
        axes.iter().map(|axis| axis.normalized_score).sum::<f64>() / axes.len() as f64;
    let classification = Classification::from_score(overall_score);

    debug!(
        school_id = %school.id,
        stage = %stage,
        overall_score,
        upgrade_points = upgrade_points.len(),
        "school report built"
    );

    SchoolReport {
        school_id: school.id.clone(),
        school_name: school.name.clone(),
        municipality: school.municipality.clone(),
        municipality_code: school.municipality_code.clone(),
        network: school.network.clone(),
        stage,
        axes,
        composite_index,
        upgrade_points,
        overall_score,
        classification,
        classification_label: classification.label(),
    }
}

fn composite_summary(history: &[&IndicatorRecord], years: &ReportYears) -> CompositeIndexSummary {
    let observed = metric_series(history, years, |metrics| metrics.composite_index);
    let projections = metric_series(history, years, |metrics| metrics.composite_projection);
    let goal_year = years.latest();

    let observed_in_goal_year = observed.last().and_then(|score| score.value);
    let goal = projections.last().and_then(|score| score.value);
    let comparison = GoalComparison {
        observed: observed_in_goal_year,
        projected: goal,
    };
    let trend = Trend::classify(observed.iter().map(|score| score.value));

    CompositeIndexSummary {
        observed,
        goal_year,
        observed_in_goal_year,
        goal,
        goal_attained: comparison.attained(),
        goal_gap: comparison.gap(),
        trend,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::MetricValues;

    fn school() -> School {
        School {
            id: "25000001".to_string(),
            name: "Escola Modelo".to_string(),
            municipality: "Patos".to_string(),
            municipality_norm: "patos".to_string(),
            municipality_code: Some("2510808".to_string()),
            network: Some("Municipal".to_string()),
        }
    }

    fn record(stage: Stage, year: i32, metrics: MetricValues) -> IndicatorRecord {
        IndicatorRecord {
            school_id: "25000001".to_string(),
            school_name: "Escola Modelo".to_string(),
            municipality: "Patos".to_string(),
            municipality_norm: "patos".to_string(),
            municipality_code: Some("2510808".to_string()),
            state: Some("PB".to_string()),
            network: Some("Municipal".to_string()),
            stage,
            year: Some(year),
            metrics,
        }
    }

    fn approval(value: f64) -> MetricValues {
        MetricValues {
            approval_rate: Some(value),
            ..MetricValues::default()
        }
    }

    #[test]
    fn approval_only_school_scores_a_quarter_of_its_axis() {
        let rows = [
            record(Stage::EarlyGrades, 2017, approval(0.80)),
            record(Stage::EarlyGrades, 2019, approval(0.85)),
            record(Stage::EarlyGrades, 2021, approval(0.90)),
        ];
        let history: Vec<&IndicatorRecord> = rows.iter().collect();
        let report = build_school_report(
            &school(),
            &history,
            Stage::EarlyGrades,
            &ReportYears::default(),
        );

        let approval_axis = &report.axes[0];
        assert_eq!(approval_axis.axis, Axis::ApprovalRate);
        assert_eq!(approval_axis.normalized_score, 90.0);
        assert_eq!(approval_axis.trend, Trend::Improving);
        assert!(report.axes[1..]
            .iter()
            .all(|axis| axis.normalized_score == 0.0 && !axis.has_data));
        assert_eq!(report.overall_score, 22.5);
        assert_eq!(report.classification, Classification::NeedsImprovement);
        assert_eq!(report.classification_label, "Needs Improvement");
        assert!(report.composite_index.goal_attained.is_none());
    }

    #[test]
    fn goal_is_compared_in_the_last_report_year() {
        let rows = [
            record(
                Stage::LateGrades,
                2019,
                MetricValues {
                    composite_index: Some(4.0),
                    composite_projection: Some(3.8),
                    ..MetricValues::default()
                },
            ),
            record(
                Stage::LateGrades,
                2021,
                MetricValues {
                    composite_index: Some(4.1),
                    composite_projection: Some(4.6),
                    ..MetricValues::default()
                },
            ),
        ];
        let history: Vec<&IndicatorRecord> = rows.iter().collect();
        let report = build_school_report(
            &school(),
            &history,
            Stage::LateGrades,
            &ReportYears::default(),
        );

        let summary = &report.composite_index;
        assert_eq!(summary.goal_year, 2021);
        assert_eq!(summary.goal, Some(4.6));
        assert_eq!(summary.goal_attained, Some(false));
        assert!((summary.goal_gap.expect("gap") + 0.5).abs() < 1e-9);
        assert!(report
            .upgrade_points
            .iter()
            .any(|point| point.area == crate::upgrades::GOAL_GAP_AREA));
    }

    #[test]
    fn other_stages_are_ignored() {
        let rows = [
            record(Stage::EarlyGrades, 2021, approval(0.95)),
            record(Stage::UpperSecondary, 2021, approval(0.40)),
        ];
        let history: Vec<&IndicatorRecord> = rows.iter().collect();
        let report = build_school_report(
            &school(),
            &history,
            Stage::UpperSecondary,
            &ReportYears::default(),
        );
        assert_eq!(report.axes[0].latest, Some(0.40));
    }

    #[test]
    fn default_stage_prefers_stages_with_data() {
        let rows = [
            record(Stage::EarlyGrades, 2021, MetricValues::default()),
            record(Stage::LateGrades, 2021, approval(0.7)),
        ];
        let history: Vec<&IndicatorRecord> = rows.iter().collect();
        assert_eq!(default_stage(&history), Some(Stage::LateGrades));

        let empty_rows = [record(Stage::UpperSecondary, 2021, MetricValues::default())];
        let history: Vec<&IndicatorRecord> = empty_rows.iter().collect();
        assert_eq!(default_stage(&history), Some(Stage::UpperSecondary));
        assert_eq!(default_stage(&[]), None);
    }
}
