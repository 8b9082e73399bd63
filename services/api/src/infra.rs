use equidar::config::DataConfig;
use equidar::error::AppError;
use equidar::indicators::IndicatorLoader;
use equidar::infrastructure::{CsvInfraScores, InfraScoreSource, NoInfraScores};
use equidar::{IndicatorStore, PerformanceService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) service: PerformanceService,
    pub(crate) infra: Arc<dyn InfraScoreSource>,
}

/// Loads the three stage exports; any failure is fatal to the caller.
pub(crate) fn load_service(data: &DataConfig) -> Result<PerformanceService, AppError> {
    let loaded = IndicatorLoader::load_all(&data.indicator_sources())?;
    let store = IndicatorStore::from_loaded(loaded);
    let stats = store.stats();
    info!(
        records = stats.records,
        schools = stats.schools,
        municipalities = stats.municipalities,
        "indicator store ready"
    );
    Ok(PerformanceService::new(
        Arc::new(store),
        data.report_years.clone(),
    ))
}

/// CSV-backed scores when either file is configured, otherwise an empty source.
pub(crate) fn load_infra(data: &DataConfig) -> Result<Arc<dyn InfraScoreSource>, AppError> {
    if data.infra_fundamental_csv.is_none() && data.infra_secondary_csv.is_none() {
        info!("no infrastructure score files configured");
        return Ok(Arc::new(NoInfraScores));
    }

    let scores = CsvInfraScores::from_paths(
        data.infra_fundamental_csv.as_deref(),
        data.infra_secondary_csv.as_deref(),
    )?;
    info!(schools = scores.len(), "infrastructure scores ready");
    Ok(Arc::new(scores))
}
