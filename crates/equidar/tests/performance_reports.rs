use equidar::indicators::{IndicatorLoader, IndicatorSource, Stage};
use equidar::infrastructure::{combine_indicators, CsvInfraScores};
use equidar::performance::{Axis, ReportYears, Trend};
use equidar::report::Classification;
use equidar::upgrades::{Impact, Priority, GOAL_GAP_AREA};
use equidar::{IndicatorStore, PerformanceService};
use std::path::PathBuf;
use std::sync::Arc;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

fn service() -> PerformanceService {
    let sources = vec![
        IndicatorSource::new(Stage::EarlyGrades, fixture("ideb_anos_iniciais.csv")),
        IndicatorSource::new(Stage::LateGrades, fixture("ideb_anos_finais.csv")),
        IndicatorSource::new(Stage::UpperSecondary, fixture("ideb_ensino_medio.csv")),
    ];
    let loaded = IndicatorLoader::load_all(&sources).expect("fixtures load");
    PerformanceService::new(
        Arc::new(IndicatorStore::from_loaded(loaded)),
        ReportYears::default(),
    )
}

fn approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn school_report_scores_every_axis() {
    let report = service()
        .school_report("25000001", None)
        .expect("alfa has a report");

    assert_eq!(report.stage, Stage::EarlyGrades);
    assert_eq!(report.municipality_code.as_deref(), Some("2504009"));

    let axes: Vec<Axis> = report.axes.iter().map(|axis| axis.axis).collect();
    assert_eq!(axes, Axis::ordered().to_vec());

    let approval = &report.axes[0];
    let years: Vec<i32> = approval.scores.iter().map(|score| score.year).collect();
    assert_eq!(years, vec![2017, 2019, 2021]);
    assert_eq!(approval.trend, Trend::Improving);
    approx(approval.normalized_score, 90.0);

    approx(report.axes[1].normalized_score, 50.0);
    approx(report.axes[2].normalized_score, 40.0);
    approx(report.axes[3].normalized_score, 55.0);
    assert!(report.axes.iter().all(|axis| axis.has_data));

    approx(report.overall_score, 58.75);
    assert_eq!(report.classification, Classification::Regular);
    assert_eq!(report.classification_label, "Regular");

    assert_eq!(report.composite_index.goal_attained, Some(true));
    let areas: Vec<(&str, Priority)> = report
        .upgrade_points
        .iter()
        .map(|point| (point.area, point.priority))
        .collect();
    assert_eq!(
        areas,
        vec![
            ("Language", Priority::Critical),
            ("Mathematics", Priority::High),
            ("Composite Index", Priority::High),
        ]
    );
    approx(report.upgrade_points[0].current_score, 210.0);
    approx(report.upgrade_points[0].target_score, 252.0);
}

#[test]
fn axes_without_values_score_zero() {
    let report = service()
        .school_report("25000002", None)
        .expect("beta has a report");

    assert_eq!(report.stage, Stage::EarlyGrades);
    for axis in &report.axes[..3] {
        assert!(!axis.has_data);
        assert!(axis.latest.is_none());
        assert_eq!(axis.normalized_score, 0.0);
    }

    let composite = &report.axes[3];
    assert_eq!(composite.latest, Some(3.0));
    approx(composite.normalized_score, 30.0);
    assert_eq!(composite.trend, Trend::Stable);

    approx(report.overall_score, 7.5);
    assert_eq!(report.classification, Classification::NeedsImprovement);
    assert_eq!(report.composite_index.goal_attained, None);

    assert_eq!(report.upgrade_points.len(), 4);
    assert!(report
        .upgrade_points
        .iter()
        .all(|point| point.priority == Priority::Critical));
    assert_eq!(report.upgrade_points[0].target_score, 0.0);
}

#[test]
fn explicit_stage_reports_goal_gap() {
    let report = service()
        .school_report("25000002", Some(Stage::LateGrades))
        .expect("beta late grades report");

    assert_eq!(report.stage, Stage::LateGrades);
    assert_eq!(report.axes[3].trend, Trend::Declining);
    assert_eq!(report.composite_index.goal_attained, Some(false));

    let gap = report
        .upgrade_points
        .iter()
        .find(|point| point.area == GOAL_GAP_AREA)
        .expect("goal gap recommended");
    assert_eq!(gap.priority, Priority::High);
    assert_eq!(gap.impact, Impact::High);
    approx(gap.current_score, 3.4);
    approx(gap.target_score, 4.2);
}

#[test]
fn unknown_school_or_missing_stage_has_no_report() {
    let service = service();
    assert!(service.school_report("00000000", None).is_none());
    assert!(service
        .school_report("25000004", Some(Stage::EarlyGrades))
        .is_none());
}

#[test]
fn municipality_report_rolls_up_latest_year() {
    let report = service()
        .municipality_report("2504009")
        .expect("campina grande report");

    assert_eq!(report.municipality_name, "Campina Grande");
    assert_eq!(report.total_schools, 3);
    assert!(report.has_data);
    assert_eq!(report.averages.year, 2021);
    approx(
        report.averages.composite_index.expect("composite average"),
        (5.5 + 3.4 + 4.4) / 3.0,
    );
    approx(report.averages.mathematics.expect("math average"), 226.5);
    approx(report.municipal_score, (5.5 + 3.4 + 4.4) / 3.0 * 10.0);

    let histogram: Vec<(Classification, usize)> = report
        .classification_histogram
        .iter()
        .map(|count| (count.classification, count.schools))
        .collect();
    assert_eq!(
        histogram,
        vec![
            (Classification::Excellent, 0),
            (Classification::Good, 0),
            (Classification::Regular, 1),
            (Classification::NeedsImprovement, 2),
        ]
    );

    let areas: Vec<&str> = report.priorities.iter().map(|point| point.area).collect();
    assert_eq!(
        areas,
        vec!["Mathematics", "Language", "Composite Index", "Approval Rate"]
    );
    assert!(report
        .priorities
        .iter()
        .all(|point| point.priority == Priority::Critical && point.impact == Impact::High));
    assert_eq!(
        report.priorities[0].description,
        "3 of 3 schools share this issue: Mathematics"
    );
}

#[test]
fn city_report_matches_municipality_report() {
    let service = service();
    let by_name = service.city_report("CAMPINA  GRANDE").expect("by name");
    let by_code = service.municipality_report("2504009").expect("by code");
    assert_eq!(by_name, by_code);

    assert!(service.city_report("Patos").is_none());
    assert!(service.municipality_report("0000000").is_none());
}

#[test]
fn combined_indicators_join_infrastructure_scores() {
    let service = service();
    let infra = CsvInfraScores::from_paths(
        Some(fixture("infra_fundamental.csv").as_path()),
        Some(fixture("infra_medio.csv").as_path()),
    )
    .expect("infrastructure fixtures load");

    let combined = combine_indicators(service.composite_panel("campina grande", None), &infra);
    let order: Vec<&str> = combined.iter().map(|row| row.school_id.as_str()).collect();
    assert_eq!(order, vec!["25000001", "25000004", "25000002"]);

    approx(combined[0].mean_composite.expect("alfa composite"), 5.0);
    approx(combined[0].combined.expect("alfa combined"), 5.75);

    let beta = &combined[2];
    approx(beta.mean_composite.expect("beta composite"), 3.25);
    approx(beta.combined.expect("beta combined"), 3.625);
}

#[test]
fn report_years_drive_series_slots() {
    let store = {
        let loaded = IndicatorLoader::load_all(&[IndicatorSource::new(
            Stage::EarlyGrades,
            fixture("ideb_anos_iniciais.csv"),
        )])
        .expect("fixture loads");
        Arc::new(IndicatorStore::from_loaded(loaded))
    };
    let years = ReportYears::new(vec![2017, 2019]).expect("valid years");
    let report = PerformanceService::new(store, years)
        .school_report("25000001", None)
        .expect("report");

    assert_eq!(report.axes[3].latest, Some(5.0));
    assert_eq!(report.composite_index.goal_year, 2019);
    assert_eq!(report.composite_index.goal, Some(5.1));
    assert_eq!(report.composite_index.goal_attained, Some(false));
}

#[test]
fn stage_exports_without_municipality_code_share_one_registry_entry() {
    let early = "\
ID_ESCOLA,NO_ESCOLA,NO_MUNICIPIO,CO_MUNICIPIO,VL_OBSERVADO_2021
1,EEEF Sol,Patos,2510808,5.0
2,EMEF Lua,Patos,2510808,3.0
";
    let secondary = "\
ID_ESCOLA,NO_ESCOLA,NO_MUNICIPIO,VL_OBSERVADO_2021
1,EEEF Sol,Patos,4.0
";
    let mut loaded =
        IndicatorLoader::from_reader(early.as_bytes(), Stage::EarlyGrades).expect("EF1 loads");
    let upper = IndicatorLoader::from_reader(secondary.as_bytes(), Stage::UpperSecondary)
        .expect("EM loads");
    loaded.records.extend(upper.records);
    loaded.sources.extend(upper.sources);
    let service = PerformanceService::new(
        Arc::new(IndicatorStore::from_loaded(loaded)),
        ReportYears::default(),
    );

    let ids: Vec<String> = service
        .schools_in_city("Patos")
        .into_iter()
        .map(|school| school.id)
        .collect();
    assert_eq!(ids, vec!["1", "2"]);

    let by_name = service.city_report("patos").expect("by name");
    assert_eq!(by_name.total_schools, 2);
    let classified: usize = by_name
        .classification_histogram
        .iter()
        .map(|count| count.schools)
        .sum();
    assert_eq!(classified, 2);
    approx(
        by_name.averages.composite_index.expect("composite average"),
        4.0,
    );

    let by_code = service.municipality_report("2510808").expect("by code");
    assert_eq!(by_name, by_code);
}
