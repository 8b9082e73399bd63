use crate::indicators::Stage;
use crate::performance::{AxisPerformance, Trend, YearScore};
use crate::upgrades::UpgradePoint;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Excellent,
    Good,
    Regular,
    NeedsImprovement,
}

impl Classification {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::Excellent,
            Self::Good,
            Self::Regular,
            Self::NeedsImprovement,
        ]
    }

    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Excellent
        } else if score >= 65.0 {
            Self::Good
        } else if score >= 50.0 {
            Self::Regular
        } else {
            Self::NeedsImprovement
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Regular => "Regular",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeIndexSummary {
    pub observed: Vec<YearScore>,
    pub goal_year: i32,
    /// Observed value in `goal_year`, not the latest non-null observation.
    pub observed_in_goal_year: Option<f64>,
    pub goal: Option<f64>,
    pub goal_attained: Option<bool>,
    /// `observed - goal`; negative means the goal was missed.
    pub goal_gap: Option<f64>,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchoolReport {
    pub school_id: String,
    pub school_name: String,
    pub municipality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipality_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    pub stage: Stage,
    pub axes: Vec<AxisPerformance>,
    pub composite_index: CompositeIndexSummary,
    pub upgrade_points: Vec<UpgradePoint>,
    pub overall_score: f64,
    pub classification: Classification,
    pub classification_label: &'static str,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MunicipalAverages {
    pub year: i32,
    pub composite_index: Option<f64>,
    pub mathematics: Option<f64>,
    pub language: Option<f64>,
    pub approval_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassificationCount {
    pub classification: Classification,
    pub label: &'static str,
    pub schools: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MunicipalityReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipality_code: Option<String>,
    pub municipality_name: String,
    pub total_schools: usize,
    pub averages: MunicipalAverages,
    pub classification_histogram: Vec<ClassificationCount>,
    pub priorities: Vec<UpgradePoint>,
    /// Composite-index normalization of `averages.composite_index`, 0.0 when absent.
    pub municipal_score: f64,
    pub has_data: bool,
}
