use crate::infra::load_service;
use clap::Args;
use equidar::config::AppConfig;
use equidar::error::AppError;
use equidar::indicators::Stage;
use equidar::report::{MunicipalityReport, SchoolReport};
use equidar::PerformanceService;
use serde::Serialize;

#[derive(Args, Debug)]
pub(crate) struct SchoolReportArgs {
    /// School identifier (ID_ESCOLA)
    pub(crate) school_id: String,
    /// Stage to report on (EF1, EF2, EM); defaults to the first stage with data
    #[arg(long)]
    pub(crate) stage: Option<Stage>,
    /// Print the report as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct MunicipalityReportArgs {
    /// Municipality code (CO_MUNICIPIO), or a city name with --by-name
    pub(crate) municipality: String,
    /// Match the argument against municipality names instead of codes
    #[arg(long)]
    pub(crate) by_name: bool,
    /// Print the report as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct SchoolsArgs {
    /// City name; accents and case are ignored
    pub(crate) city: String,
    /// Print the listing as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

fn configured_service() -> Result<PerformanceService, AppError> {
    let config = AppConfig::load()?;
    load_service(&config.data)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}

pub(crate) fn run_school_report(args: SchoolReportArgs) -> Result<(), AppError> {
    let service = configured_service()?;
    let report = service
        .school_report(&args.school_id, args.stage)
        .ok_or_else(|| AppError::NotFound(format!("school {}", args.school_id)))?;

    if args.json {
        print_json(&report)
    } else {
        render_school_report(&report);
        Ok(())
    }
}

pub(crate) fn run_municipality_report(args: MunicipalityReportArgs) -> Result<(), AppError> {
    let service = configured_service()?;
    let report = if args.by_name {
        service.city_report(&args.municipality)
    } else {
        service.municipality_report(&args.municipality)
    }
    .ok_or_else(|| AppError::NotFound(format!("municipality {}", args.municipality)))?;

    if args.json {
        print_json(&report)
    } else {
        render_municipality_report(&report);
        Ok(())
    }
}

pub(crate) fn run_school_listing(args: SchoolsArgs) -> Result<(), AppError> {
    let service = configured_service()?;
    let schools = service.schools_in_city(&args.city);
    if schools.is_empty() {
        return Err(AppError::NotFound(format!("city {}", args.city)));
    }

    if args.json {
        return print_json(&schools);
    }

    println!("Schools in {} ({})", schools[0].municipality, schools.len());
    for school in &schools {
        let network = school.network.as_deref().unwrap_or("unknown network");
        println!("- {} | {} | {}", school.id, school.name, network);
    }
    Ok(())
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:.2}"),
        None => "-".to_string(),
    }
}

fn render_school_report(report: &SchoolReport) {
    println!("School report: {} ({})", report.school_name, report.school_id);
    println!(
        "Municipality: {} | Stage: {} | Network: {}",
        report.municipality,
        report.stage.label(),
        report.network.as_deref().unwrap_or("unknown")
    );
    println!(
        "Overall score: {:.1}/100 ({})",
        report.overall_score, report.classification_label
    );

    println!("\nAxes");
    for axis in &report.axes {
        let series: Vec<String> = axis
            .scores
            .iter()
            .map(|score| format!("{}={}", score.year, format_value(score.value)))
            .collect();
        let note = if axis.has_data { "" } else { " (no data)" };
        println!(
            "- {}: {:.1}/100, trend {}{} [{}]",
            axis.axis_label,
            axis.normalized_score,
            axis.trend.label(),
            note,
            series.join(", ")
        );
    }

    let composite = &report.composite_index;
    let goal_note = match composite.goal_attained {
        Some(true) => "goal attained",
        Some(false) => "goal missed",
        None => "goal not comparable",
    };
    println!(
        "\nComposite index {}: observed {}, goal {} ({goal_note})",
        composite.goal_year,
        format_value(composite.observed_in_goal_year),
        format_value(composite.goal)
    );

    if report.upgrade_points.is_empty() {
        println!("\nUpgrade points: none");
    } else {
        println!("\nUpgrade points");
        for point in &report.upgrade_points {
            println!(
                "- [{}] {}: {:.2} -> {:.2} (impact {})",
                point.priority.label(),
                point.area,
                point.current_score,
                point.target_score,
                point.impact.label()
            );
        }
    }
}

fn render_municipality_report(report: &MunicipalityReport) {
    println!(
        "Municipality report: {} ({})",
        report.municipality_name,
        report.municipality_code.as_deref().unwrap_or("no code")
    );
    println!("Schools: {}", report.total_schools);
    if report.has_data {
        println!("Municipal score: {:.1}/100", report.municipal_score);
    } else {
        println!("Municipal score: no composite index data");
    }

    let averages = &report.averages;
    println!("\nAverages for {}", averages.year);
    println!("- Composite index: {}", format_value(averages.composite_index));
    println!("- Mathematics: {}", format_value(averages.mathematics));
    println!("- Language: {}", format_value(averages.language));
    println!("- Approval rate: {}", format_value(averages.approval_rate));

    println!("\nClassification");
    for bucket in &report.classification_histogram {
        println!("- {}: {}", bucket.label, bucket.schools);
    }

    if report.priorities.is_empty() {
        println!("\nPriorities: none");
    } else {
        println!("\nPriorities");
        for point in &report.priorities {
            println!(
                "- [{}] {} (impact {})",
                point.priority.label(),
                point.description,
                point.impact.label()
            );
        }
    }
}
