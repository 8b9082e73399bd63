//! Pure query functions handed to the transport layer.

use crate::indicators::{normalize_municipality, School, Stage};
use crate::performance::ReportYears;
use crate::report::{
    build_municipality_report, build_school_report, composite_panel, default_stage,
    MunicipalityReport, SchoolCompositePanel, SchoolReport,
};
use crate::store::IndicatorStore;
use std::sync::Arc;

/// Cheap to clone; every clone shares the same immutable store.
#[derive(Debug, Clone)]
pub struct PerformanceService {
    store: Arc<IndicatorStore>,
    years: ReportYears,
}

impl PerformanceService {
    pub fn new(store: Arc<IndicatorStore>, years: ReportYears) -> Self {
        Self { store, years }
    }

    pub fn store(&self) -> &IndicatorStore {
        &self.store
    }

    pub fn years(&self) -> &ReportYears {
        &self.years
    }

    /// Schools of a city, sorted by name. The query is normalized here.
    pub fn schools_in_city(&self, city: &str) -> Vec<School> {
        let normalized = normalize_municipality(city);
        self.store
            .schools_by_municipality(&normalized)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn composite_panel(&self, city: &str, year: Option<i32>) -> Vec<SchoolCompositePanel> {
        let normalized = normalize_municipality(city);
        let records = self.store.records_by_municipality(&normalized, year);
        composite_panel(&records)
    }

    /// `None` when the school is unknown or the requested stage has no rows.
    pub fn school_report(&self, school_id: &str, stage: Option<Stage>) -> Option<SchoolReport> {
        let school = self.store.school(school_id)?;
        let history = self.store.records_by_school(school_id);
        let stage = match stage {
            Some(stage) if history.iter().any(|record| record.stage == stage) => stage,
            Some(_) => return None,
            None => default_stage(&history)?,
        };
        Some(build_school_report(&school, &history, stage, &self.years))
    }

    pub fn municipality_report(&self, municipality_code: &str) -> Option<MunicipalityReport> {
        let schools = self.store.schools_by_municipality_code(municipality_code);
        build_municipality_report(&schools, &self.store, &self.years)
    }

    pub fn city_report(&self, city: &str) -> Option<MunicipalityReport> {
        let normalized = normalize_municipality(city);
        let schools = self.store.schools_by_municipality(&normalized);
        build_municipality_report(&schools, &self.store, &self.years)
    }
}
