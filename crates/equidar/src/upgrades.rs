//! Upgrade-Point Synthesizer: turns axis results and the composite-index goal
//! into a ranked, capped list of improvement recommendations.

use crate::performance::AxisPerformance;
use serde::Serialize;

pub const MAX_UPGRADE_POINTS: usize = 5;
pub const CRITICAL_BELOW: f64 = 50.0;
pub const HIGH_BELOW: f64 = 70.0;
/// Flat improvement target applied to the latest raw value.
pub const TARGET_MULTIPLIER: f64 = 1.2;
pub const GOAL_GAP_AREA: &str = "Composite Index Goal";

/// Ordered worst to best; sorting ascending puts critical first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    High,
    Medium,
    Low,
}

impl Impact {
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpgradePoint {
    pub area: &'static str,
    pub description: String,
    pub priority: Priority,
    pub current_score: f64,
    pub target_score: f64,
    pub impact: Impact,
}

/// Observed and projected composite index for the most recent report year.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GoalComparison {
    pub observed: Option<f64>,
    pub projected: Option<f64>,
}

impl GoalComparison {
    pub fn gap(&self) -> Option<f64> {
        Some(self.observed? - self.projected?)
    }

    pub fn attained(&self) -> Option<bool> {
        Some(self.observed? >= self.projected?)
    }
}

pub fn synthesize(axes: &[AxisPerformance], goal: GoalComparison) -> Vec<UpgradePoint> {
    let mut points: Vec<UpgradePoint> = axes.iter().filter_map(axis_point).collect();

    if let (Some(observed), Some(projected)) = (goal.observed, goal.projected) {
        if observed < projected {
            points.push(UpgradePoint {
                area: GOAL_GAP_AREA,
                description: format!(
                    "Composite index {observed:.2} is below the projected goal of {projected:.2}; close the {:.2} point gap",
                    projected - observed
                ),
                priority: Priority::High,
                current_score: observed,
                target_score: projected,
                impact: Impact::High,
            });
        }
    }

    rank(&mut points);
    points.truncate(MAX_UPGRADE_POINTS);
    points
}

/// Stable sort by priority tier, worst first.
pub fn rank(points: &mut [UpgradePoint]) {
    points.sort_by_key(|point| point.priority);
}

fn axis_point(performance: &AxisPerformance) -> Option<UpgradePoint> {
    let score = performance.normalized_score;
    let (priority, impact, severity) = if score < CRITICAL_BELOW {
        (Priority::Critical, Impact::High, "critically low")
    } else if score < HIGH_BELOW {
        (Priority::High, Impact::Medium, "below the expected level")
    } else {
        return None;
    };

    let current = performance.latest.unwrap_or(0.0);
    Some(UpgradePoint {
        area: performance.axis.label(),
        description: format!(
            "{} is {severity} (normalized score {score:.1}/100); aim for a 20% gain over the latest result",
            performance.axis.label()
        ),
        priority,
        current_score: current,
        target_score: current * TARGET_MULTIPLIER,
        impact,
    })
}
