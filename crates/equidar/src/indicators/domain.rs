use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Schooling band an export belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Stage {
    #[serde(rename = "EF1")]
    EarlyGrades,
    #[serde(rename = "EF2")]
    LateGrades,
    #[serde(rename = "EM")]
    UpperSecondary,
}

impl Stage {
    pub const fn ordered() -> [Self; 3] {
        [Self::EarlyGrades, Self::LateGrades, Self::UpperSecondary]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::EarlyGrades => "EF1",
            Self::LateGrades => "EF2",
            Self::UpperSecondary => "EM",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::EarlyGrades => "Early Grades",
            Self::LateGrades => "Late Grades",
            Self::UpperSecondary => "Upper Secondary",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStage(pub String);

impl fmt::Display for UnknownStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown stage '{}', expected EF1, EF2 or EM", self.0)
    }
}

impl std::error::Error for UnknownStage {}

impl FromStr for Stage {
    type Err = UnknownStage;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "EF1" => Ok(Self::EarlyGrades),
            "EF2" => Ok(Self::LateGrades),
            "EM" => Ok(Self::UpperSecondary),
            _ => Err(UnknownStage(value.to_string())),
        }
    }
}

/// One raw export file for one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorSource {
    pub stage: Stage,
    pub path: PathBuf,
}

impl IndicatorSource {
    pub fn new(stage: Stage, path: impl Into<PathBuf>) -> Self {
        Self {
            stage,
            path: path.into(),
        }
    }
}

/// The metrics observed for one (school, stage, year) coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricValues {
    pub approval_rate: Option<f64>,
    pub math_score: Option<f64>,
    pub language_score: Option<f64>,
    pub mean_score: Option<f64>,
    pub composite_index: Option<f64>,
    pub composite_projection: Option<f64>,
}

impl MetricValues {
    pub fn is_empty(&self) -> bool {
        self.approval_rate.is_none()
            && self.math_score.is_none()
            && self.language_score.is_none()
            && self.mean_score.is_none()
            && self.composite_index.is_none()
            && self.composite_projection.is_none()
    }
}

/// Canonical long-format row produced by the loader.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRecord {
    pub school_id: String,
    pub school_name: String,
    pub municipality: String,
    /// Accent- and case-folded municipality name, used only for lookups.
    pub municipality_norm: String,
    pub municipality_code: Option<String>,
    pub state: Option<String>,
    pub network: Option<String>,
    pub stage: Stage,
    pub year: Option<i32>,
    pub metrics: MetricValues,
}

/// Deduplicated school identity derived from indicator records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct School {
    pub id: String,
    pub name: String,
    pub municipality: String,
    pub municipality_norm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipality_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
}

impl School {
    pub(crate) fn from_record(record: &IndicatorRecord) -> Self {
        Self {
            id: record.school_id.clone(),
            name: record.school_name.clone(),
            municipality: record.municipality.clone(),
            municipality_norm: record.municipality_norm.clone(),
            municipality_code: record.municipality_code.clone(),
            network: record.network.clone(),
        }
    }

    pub(crate) fn fill_missing_from(&mut self, record: &IndicatorRecord) {
        if self.municipality_code.is_none() {
            self.municipality_code = record.municipality_code.clone();
        }
        if self.network.is_none() {
            self.network = record.network.clone();
        }
    }
}
