use super::columns::{self, ColumnPlan, IdentityColumns, LayoutKind, MetricCell, SourceLayout};
use super::domain::{IndicatorRecord, MetricValues, Stage};
use super::normalizer::normalize_municipality;
use super::IndicatorLoadError;
use csv::StringRecord;
use std::io::Read;
use tracing::debug;

/// Cell-level coercion counts for one source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataQualityWarnings {
    /// Cells holding a missing-value sentinel (`-` or empty).
    pub sentinels: usize,
    /// Cells that were present but not numeric.
    pub non_numeric: usize,
}

impl DataQualityWarnings {
    pub fn total(&self) -> usize {
        self.sentinels + self.non_numeric
    }
}

#[derive(Debug)]
pub(crate) struct ParsedSource {
    pub(crate) layout: LayoutKind,
    pub(crate) rows: usize,
    pub(crate) records: Vec<IndicatorRecord>,
    pub(crate) warnings: DataQualityWarnings,
}

pub(crate) fn parse_source<R: Read>(
    reader: R,
    stage: Stage,
) -> Result<ParsedSource, IndicatorLoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let plan = columns::plan(&headers)?;

    let mut rows = 0usize;
    let mut records = Vec::new();
    let mut warnings = DataQualityWarnings::default();

    for row in csv_reader.records() {
        let row = row?;
        rows += 1;
        melt_row(&plan, &headers, &row, stage, &mut records, &mut warnings);
    }

    Ok(ParsedSource {
        layout: plan.layout.kind(),
        rows,
        records,
        warnings,
    })
}

fn melt_row(
    plan: &ColumnPlan,
    headers: &StringRecord,
    row: &StringRecord,
    stage: Stage,
    out: &mut Vec<IndicatorRecord>,
    warnings: &mut DataQualityWarnings,
) {
    match &plan.layout {
        SourceLayout::Wide { years } => {
            for (year, cells) in years {
                let metrics = read_metrics(cells, headers, row, warnings);
                out.push(build_record(&plan.identity, row, stage, Some(*year), metrics));
            }
        }
        SourceLayout::Long {
            year,
            metrics: cells,
        } => {
            let year = parse_year(row.get(*year), headers.get(*year), warnings);
            let metrics = read_metrics(cells, headers, row, warnings);
            out.push(build_record(&plan.identity, row, stage, year, metrics));
        }
    }
}

fn build_record(
    identity: &IdentityColumns,
    row: &StringRecord,
    stage: Stage,
    year: Option<i32>,
    metrics: MetricValues,
) -> IndicatorRecord {
    let text = |index: usize| row.get(index).unwrap_or_default().to_string();
    let optional_text = |index: Option<usize>| {
        index
            .and_then(|index| row.get(index))
            .filter(|value| !value.is_empty() && *value != "-")
            .map(str::to_string)
    };

    let municipality = text(identity.municipality);
    let municipality_norm = normalize_municipality(&municipality);

    IndicatorRecord {
        school_id: text(identity.school_id),
        school_name: text(identity.school_name),
        municipality,
        municipality_norm,
        municipality_code: optional_text(identity.municipality_code),
        state: optional_text(identity.state),
        network: optional_text(identity.network),
        stage,
        year,
        metrics,
    }
}

fn read_metrics(
    cells: &[MetricCell],
    headers: &StringRecord,
    row: &StringRecord,
    warnings: &mut DataQualityWarnings,
) -> MetricValues {
    let mut metrics = MetricValues::default();
    for cell in cells {
        let value = parse_metric(row.get(cell.index), headers.get(cell.index), warnings);
        cell.metric.assign(&mut metrics, value);
    }
    metrics
}

/// Coerces a metric cell; sentinels and garbage become `None`, never zero.
fn parse_metric(
    raw: Option<&str>,
    column: Option<&str>,
    warnings: &mut DataQualityWarnings,
) -> Option<f64> {
    let raw = raw.unwrap_or_default().trim();
    if is_sentinel(raw) {
        warnings.sentinels += 1;
        return None;
    }

    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            warnings.non_numeric += 1;
            debug!(
                column = column.unwrap_or("?"),
                value = raw,
                "data quality warning: non-numeric metric coerced to null"
            );
            None
        }
    }
}

fn parse_year(
    raw: Option<&str>,
    column: Option<&str>,
    warnings: &mut DataQualityWarnings,
) -> Option<i32> {
    let value = parse_metric(raw, column, warnings)?;
    if value.fract() == 0.0 && value >= i32::MIN as f64 && value <= i32::MAX as f64 {
        Some(value as i32)
    } else {
        warnings.non_numeric += 1;
        debug!(
            column = column.unwrap_or("?"),
            value, "data quality warning: fractional year coerced to null"
        );
        None
    }
}

fn is_sentinel(value: &str) -> bool {
    value.is_empty() || value == "-"
}

#[cfg(test)]
pub(crate) fn parse_metric_for_tests(raw: &str) -> (Option<f64>, DataQualityWarnings) {
    let mut warnings = DataQualityWarnings::default();
    let value = parse_metric(Some(raw), Some("VL_OBSERVADO"), &mut warnings);
    (value, warnings)
}
