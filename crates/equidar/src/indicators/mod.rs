//! Indicator Loader: reads per-stage exports in either the wide (one column
//! per year) or long (one row per year) layout and melts them into canonical
//! [`IndicatorRecord`] rows.

mod columns;
pub mod domain;
mod normalizer;
mod parser;

use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

pub use columns::LayoutKind;
pub use domain::{IndicatorRecord, IndicatorSource, MetricValues, School, Stage, UnknownStage};
pub use normalizer::normalize_municipality;
pub use parser::DataQualityWarnings;

/// The export's header row fits neither known layout.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("no per-year metric columns and no year column (AN_REFERENCIA, ANO, NU_ANO) among {columns:?}")]
    UnrecognizedLayout { columns: Vec<String> },
    #[error("required column {column} not found")]
    MissingColumn { column: &'static str },
    #[error("long layout export has no known metric column")]
    NoMetricColumns,
}

#[derive(Debug, thiserror::Error)]
pub enum IndicatorLoadError {
    #[error("failed to read indicator export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid indicator CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("unrecognized indicator export schema: {0}")]
    Schema(#[from] SchemaError),
    #[error("{stage} export {path}: {source}")]
    Source {
        stage: Stage,
        path: String,
        #[source]
        source: Box<IndicatorLoadError>,
    },
}

/// Per-source outcome of a load, kept for startup logging and readiness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    pub stage: Stage,
    pub layout: LayoutKind,
    pub rows: usize,
    pub records: usize,
    pub warnings: DataQualityWarnings,
}

/// Canonical records from one or more sources, in source order.
#[derive(Debug, Clone, Default)]
pub struct LoadedIndicators {
    pub records: Vec<IndicatorRecord>,
    pub sources: Vec<SourceSummary>,
}

pub struct IndicatorLoader;

impl IndicatorLoader {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        stage: Stage,
    ) -> Result<LoadedIndicators, IndicatorLoadError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, stage)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        stage: Stage,
    ) -> Result<LoadedIndicators, IndicatorLoadError> {
        let parsed = parser::parse_source(reader, stage)?;
        let summary = SourceSummary {
            stage,
            layout: parsed.layout,
            rows: parsed.rows,
            records: parsed.records.len(),
            warnings: parsed.warnings,
        };

        info!(
            stage = %stage,
            layout = ?summary.layout,
            rows = summary.rows,
            records = summary.records,
            "indicator export loaded"
        );
        if summary.warnings.non_numeric > 0 {
            warn!(
                stage = %stage,
                non_numeric = summary.warnings.non_numeric,
                sentinels = summary.warnings.sentinels,
                "non-numeric indicator cells coerced to null"
            );
        }

        Ok(LoadedIndicators {
            records: parsed.records,
            sources: vec![summary],
        })
    }

    /// Loads every source in order; the first failure aborts the whole load.
    pub fn load_all(sources: &[IndicatorSource]) -> Result<LoadedIndicators, IndicatorLoadError> {
        let mut loaded = LoadedIndicators::default();
        for source in sources {
            let part = Self::from_path(&source.path, source.stage).map_err(|err| {
                IndicatorLoadError::Source {
                    stage: source.stage,
                    path: source.path.display().to_string(),
                    source: Box::new(err),
                }
            })?;
            loaded.records.extend(part.records);
            loaded.sources.extend(part.sources);
        }
        Ok(loaded)
    }
}
