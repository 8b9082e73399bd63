//! Indicator Store: the loaded-once, read-only record set plus a
//! deduplicated school registry.

use crate::indicators::{IndicatorRecord, LoadedIndicators, School, SourceSummary, Stage};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub loaded_at: DateTime<Utc>,
    pub records: usize,
    pub schools: usize,
    pub municipalities: usize,
}

/// Immutable after construction; share it behind an `Arc`.
#[derive(Debug)]
pub struct IndicatorStore {
    records: Vec<IndicatorRecord>,
    schools: Vec<School>,
    registry: HashMap<String, usize>,
    by_school: HashMap<String, Vec<usize>>,
    by_municipality: HashMap<String, Vec<usize>>,
    sources: Vec<SourceSummary>,
    loaded_at: DateTime<Utc>,
}

impl IndicatorStore {
    pub fn new(records: Vec<IndicatorRecord>) -> Self {
        Self::from_loaded(LoadedIndicators {
            records,
            sources: Vec::new(),
        })
    }

    pub fn from_loaded(loaded: LoadedIndicators) -> Self {
        let LoadedIndicators { records, sources } = loaded;
        let mut schools: Vec<School> = Vec::new();
        let mut registry: HashMap<String, usize> = HashMap::new();
        let mut by_school: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_municipality: HashMap<String, Vec<usize>> = HashMap::new();

        for (index, record) in records.iter().enumerate() {
            by_school
                .entry(record.school_id.clone())
                .or_default()
                .push(index);
            by_municipality
                .entry(record.municipality_norm.clone())
                .or_default()
                .push(index);

            match registry.get(&record.school_id) {
                Some(&slot) => schools[slot].fill_missing_from(record),
                None => {
                    registry.insert(record.school_id.clone(), schools.len());
                    schools.push(School::from_record(record));
                }
            }
        }

        schools.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        let registry = schools
            .iter()
            .enumerate()
            .map(|(slot, school)| (school.id.clone(), slot))
            .collect();

        Self {
            records,
            schools,
            registry,
            by_school,
            by_municipality,
            sources,
            loaded_at: Utc::now(),
        }
    }

    pub fn records(&self) -> &[IndicatorRecord] {
        &self.records
    }

    pub fn sources(&self) -> &[SourceSummary] {
        &self.sources
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            loaded_at: self.loaded_at,
            records: self.records.len(),
            schools: self.schools.len(),
            municipalities: self.by_municipality.len(),
        }
    }

    /// Schools of a municipality, by exact match on the normalized name.
    pub fn schools_by_municipality(&self, normalized_name: &str) -> Vec<&School> {
        self.schools
            .iter()
            .filter(|school| school.municipality_norm == normalized_name)
            .collect()
    }

    /// Schools whose export row carried the given municipality code.
    pub fn schools_by_municipality_code(&self, code: &str) -> Vec<&School> {
        let code = code.trim();
        self.schools
            .iter()
            .filter(|school| school.municipality_code.as_deref() == Some(code))
            .collect()
    }

    /// Records of a municipality; `year` is an equality filter.
    pub fn records_by_municipality(
        &self,
        normalized_name: &str,
        year: Option<i32>,
    ) -> Vec<&IndicatorRecord> {
        self.by_municipality
            .get(normalized_name)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&index| &self.records[index])
                    .filter(|record| year.is_none() || record.year == year)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every record of a school, all stages and years.
    pub fn records_by_school(&self, school_id: &str) -> Vec<&IndicatorRecord> {
        self.by_school
            .get(school_id)
            .map(|indices| indices.iter().map(|&index| &self.records[index]).collect())
            .unwrap_or_default()
    }

    /// Registry entry for a school. One entry per id: the first name and
    /// municipality seen win, a missing code or network is taken from a
    /// later row of the same school.
    pub fn school(&self, school_id: &str) -> Option<School> {
        let slot = *self.registry.get(school_id)?;
        Some(self.schools[slot].clone())
    }

    /// Stages with at least one record for the school, in canonical order.
    pub fn stages_for_school(&self, school_id: &str) -> Vec<Stage> {
        let present: HashSet<Stage> = self
            .records_by_school(school_id)
            .into_iter()
            .map(|record| record.stage)
            .collect();
        Stage::ordered()
            .into_iter()
            .filter(|stage| present.contains(stage))
            .collect()
    }

    /// Municipality display names keyed by normalized name.
    pub fn municipalities(&self) -> BTreeMap<&str, &str> {
        self.schools
            .iter()
            .map(|school| (school.municipality_norm.as_str(), school.municipality.as_str()))
            .collect()
    }
}
