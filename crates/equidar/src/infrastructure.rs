//! Join seam for the external infrastructure score source. Scores are
//! computed elsewhere; this crate only looks them up by school id.

use crate::report::SchoolCompositePanel;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

const ID_COLUMNS: [&str; 4] = ["ID_ESCOLA", "id_escola", "CO_ENTIDADE", "co_entidade"];
const SCORE_COLUMNS: [&str; 3] = ["score_infraestrutura", "score", "score_total"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct InfraScore {
    pub fundamental: Option<f64>,
    pub secondary: Option<f64>,
    pub combined: Option<f64>,
}

pub trait InfraScoreSource: Send + Sync {
    fn score(&self, school_id: &str) -> Option<InfraScore>;
}

/// Source with no data; every lookup misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInfraScores;

impl InfraScoreSource for NoInfraScores {
    fn score(&self, _school_id: &str) -> Option<InfraScore> {
        None
    }
}

impl InfraScoreSource for HashMap<String, InfraScore> {
    fn score(&self, school_id: &str) -> Option<InfraScore> {
        self.get(school_id).copied()
    }
}

#[derive(Debug, Error)]
pub enum InfraLoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("no school id column (ID_ESCOLA, CO_ENTIDADE) in {level} scores")]
    MissingIdColumn { level: &'static str },
}

/// Which school level a score file covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfraLevel {
    Fundamental,
    Secondary,
}

impl InfraLevel {
    pub fn label(&self) -> &'static str {
        match self {
            InfraLevel::Fundamental => "fundamental",
            InfraLevel::Secondary => "secondary",
        }
    }
}

/// Scores read from the per-level CSV exports, merged by school id.
#[derive(Debug, Clone, Default)]
pub struct CsvInfraScores {
    scores: HashMap<String, InfraScore>,
}

impl CsvInfraScores {
    pub fn from_paths(
        fundamental: Option<&Path>,
        secondary: Option<&Path>,
    ) -> Result<Self, InfraLoadError> {
        let fundamental = match fundamental {
            Some(path) => read_level(File::open(path)?, InfraLevel::Fundamental)?,
            None => HashMap::new(),
        };
        let secondary = match secondary {
            Some(path) => read_level(File::open(path)?, InfraLevel::Secondary)?,
            None => HashMap::new(),
        };
        Ok(Self::merge(fundamental, secondary))
    }

    pub fn from_readers<F: Read, S: Read>(
        fundamental: F,
        secondary: S,
    ) -> Result<Self, InfraLoadError> {
        let fundamental = read_level(fundamental, InfraLevel::Fundamental)?;
        let secondary = read_level(secondary, InfraLevel::Secondary)?;
        Ok(Self::merge(fundamental, secondary))
    }

    fn merge(
        fundamental: HashMap<String, Option<f64>>,
        mut secondary: HashMap<String, Option<f64>>,
    ) -> Self {
        let mut scores = HashMap::new();
        for (id, fund) in fundamental {
            let med = secondary.remove(&id).flatten();
            scores.insert(id, InfraScore::from_levels(fund, med));
        }
        for (id, med) in secondary {
            scores.insert(id, InfraScore::from_levels(None, med));
        }
        Self { scores }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl InfraScoreSource for CsvInfraScores {
    fn score(&self, school_id: &str) -> Option<InfraScore> {
        self.scores.get(school_id).copied()
    }
}

impl InfraScore {
    fn from_levels(fundamental: Option<f64>, secondary: Option<f64>) -> Self {
        Self {
            fundamental,
            secondary,
            combined: mean([fundamental, secondary].into_iter().flatten()),
        }
    }
}

/// One school id per entry; duplicate ids are averaged over their numeric
/// scores. A file without any score column yields ids with no score.
fn read_level<R: Read>(
    reader: R,
    level: InfraLevel,
) -> Result<HashMap<String, Option<f64>>, InfraLoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let position = |candidates: &[&str]| {
        candidates
            .iter()
            .find_map(|name| headers.iter().position(|header| header == *name))
    };

    let id_index = position(&ID_COLUMNS[..]).ok_or(InfraLoadError::MissingIdColumn {
        level: level.label(),
    })?;
    let score_index = position(&SCORE_COLUMNS[..]);
    if score_index.is_none() {
        warn!(level = level.label(), "infrastructure file has no score column");
    }

    let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
    for row in csv_reader.records() {
        let row = row?;
        let Some(id) = row.get(id_index).filter(|id| !id.is_empty()) else {
            continue;
        };
        let entry = sums.entry(id.to_string()).or_insert((0.0, 0));
        let value = score_index
            .and_then(|index| row.get(index))
            .and_then(|raw| raw.parse::<f64>().ok())
            .filter(|value| value.is_finite());
        if let Some(value) = value {
            entry.0 += value;
            entry.1 += 1;
        }
    }

    info!(level = level.label(), schools = sums.len(), "infrastructure scores loaded");

    Ok(sums
        .into_iter()
        .map(|(id, (sum, count))| {
            let score = (count > 0).then(|| sum / count as f64);
            (id, score)
        })
        .collect())
}

/// A school's mean composite index joined with its infrastructure score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedIndicator {
    pub school_id: String,
    pub school_name: String,
    pub mean_composite: Option<f64>,
    pub infrastructure: Option<InfraScore>,
    /// Mean of the composite mean and the infrastructure score when both exist.
    pub combined: Option<f64>,
    pub panel: SchoolCompositePanel,
}

/// Joins panels with `source` by school id and sorts by combined score
/// descending, schools without one last, then by name.
pub fn combine_indicators(
    panels: Vec<SchoolCompositePanel>,
    source: &dyn InfraScoreSource,
) -> Vec<CombinedIndicator> {
    let mut combined: Vec<CombinedIndicator> = panels
        .into_iter()
        .map(|panel| {
            let mean_composite = panel.mean_composite();
            let infrastructure = source.score(&panel.school_id);
            let infra_score = infrastructure.and_then(|score| score.combined);
            let combined = match (mean_composite, infra_score) {
                (Some(composite), Some(infra)) => Some((composite + infra) / 2.0),
                _ => None,
            };
            CombinedIndicator {
                school_id: panel.school_id.clone(),
                school_name: panel.school_name.clone(),
                mean_composite,
                infrastructure,
                combined,
                panel,
            }
        })
        .collect();

    combined.sort_by(|a, b| {
        let by_score = match (a.combined, b.combined) {
            (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_score.then_with(|| a.school_name.cmp(&b.school_name))
    });
    combined
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| {
        (sum + value, count + 1)
    });
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::Stage;
    use std::collections::BTreeMap;

    fn panel(id: &str, name: &str, values: &[(Stage, i32, Option<f64>)]) -> SchoolCompositePanel {
        let mut composite: BTreeMap<Stage, BTreeMap<i32, Option<f64>>> = BTreeMap::new();
        for (stage, year, value) in values {
            composite.entry(*stage).or_default().insert(*year, *value);
        }
        SchoolCompositePanel {
            school_id: id.to_string(),
            school_name: name.to_string(),
            composite,
        }
    }

    #[test]
    fn merges_levels_and_averages_duplicate_ids() {
        let fundamental = "ID_ESCOLA,score_infraestrutura\n1,60\n1,80\n2,-\n";
        let secondary = "co_entidade,score\n1,50\n3,40\n";
        let scores =
            CsvInfraScores::from_readers(fundamental.as_bytes(), secondary.as_bytes())
                .expect("scores load");

        assert_eq!(scores.len(), 3);
        let first = scores.score("1").expect("school 1");
        assert_eq!(first.fundamental, Some(70.0));
        assert_eq!(first.secondary, Some(50.0));
        assert_eq!(first.combined, Some(60.0));

        let second = scores.score("2").expect("school 2");
        assert_eq!(second.combined, None);

        let third = scores.score("3").expect("school 3");
        assert_eq!(third.fundamental, None);
        assert_eq!(third.combined, Some(40.0));
    }

    #[test]
    fn missing_score_column_yields_ids_without_scores() {
        let fundamental = "ID_ESCOLA,other\n9,1\n";
        let scores = CsvInfraScores::from_readers(fundamental.as_bytes(), "ID_ESCOLA\n".as_bytes())
            .expect("scores load");
        assert_eq!(scores.score("9"), Some(InfraScore::default()));
    }

    #[test]
    fn missing_id_column_is_an_error() {
        let result = CsvInfraScores::from_readers("escola,score\n1,2\n".as_bytes(), "".as_bytes());
        assert!(matches!(
            result,
            Err(InfraLoadError::MissingIdColumn {
                level: "fundamental"
            })
        ));
    }

    #[test]
    fn combined_indicators_sort_by_score_then_name() {
        let panels = vec![
            panel("1", "Beta", &[(Stage::EarlyGrades, 2019, Some(4.0))]),
            panel(
                "2",
                "Alfa",
                &[
                    (Stage::EarlyGrades, 2019, Some(5.0)),
                    (Stage::EarlyGrades, 2021, Some(7.0)),
                    (Stage::LateGrades, 2021, Some(4.0)),
                ],
            ),
            panel("3", "Gama", &[(Stage::EarlyGrades, 2021, None)]),
            panel("4", "Delta", &[(Stage::EarlyGrades, 2021, Some(9.0))]),
        ];
        let mut source = HashMap::new();
        source.insert("1".to_string(), InfraScore::from_levels(Some(10.0), None));
        source.insert("2".to_string(), InfraScore::from_levels(Some(6.0), Some(8.0)));
        source.insert("3".to_string(), InfraScore::from_levels(Some(50.0), None));

        let combined = combine_indicators(panels, &source);
        let order: Vec<&str> = combined.iter().map(|row| row.school_id.as_str()).collect();
        assert_eq!(order, vec!["1", "2", "4", "3"]);

        assert_eq!(combined[0].combined, Some(7.0));
        assert_eq!(combined[1].mean_composite, Some(5.0));
        assert_eq!(combined[1].combined, Some(6.0));
        assert_eq!(combined[2].combined, None);
        assert!(combined[2].infrastructure.is_none());
        assert_eq!(combined[3].mean_composite, None);
    }
}
