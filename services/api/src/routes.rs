use crate::infra::AppState;
use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use equidar::error::AppError;
use equidar::indicators::{School, Stage};
use equidar::infrastructure::{combine_indicators, CombinedIndicator};
use equidar::report::{MunicipalityReport, SchoolCompositePanel, SchoolReport};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct YearQuery {
    pub(crate) year: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StageQuery {
    pub(crate) stage: Option<String>,
}

pub(crate) fn router() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/cities/:city/schools", get(city_schools))
        .route("/api/v1/cities/:city/indicators", get(city_indicators))
        .route(
            "/api/v1/cities/:city/indicators/combined",
            get(city_combined_indicators),
        )
        .route("/api/v1/cities/:city/report", get(city_report))
        .route("/api/v1/schools/:school_id/report", get(school_report))
        .route(
            "/api/v1/municipalities/:code/report",
            get(municipality_report),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    if !ready {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        );
    }

    let stats = state.service.store().stats();
    (
        StatusCode::OK,
        Json(json!({
            "status": "ready",
            "loaded_at": stats.loaded_at,
            "records": stats.records,
            "schools": stats.schools,
            "municipalities": stats.municipalities,
        })),
    )
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn city_schools(
    Extension(state): Extension<AppState>,
    Path(city): Path<String>,
) -> Result<Json<Vec<School>>, AppError> {
    let schools = state.service.schools_in_city(&city);
    if schools.is_empty() {
        return Err(AppError::NotFound(format!("schools for city '{city}'")));
    }
    Ok(Json(schools))
}

pub(crate) async fn city_indicators(
    Extension(state): Extension<AppState>,
    Path(city): Path<String>,
    Query(query): Query<YearQuery>,
) -> Result<Json<Vec<SchoolCompositePanel>>, AppError> {
    let panels = state.service.composite_panel(&city, query.year);
    if panels.is_empty() {
        return Err(AppError::NotFound(format!(
            "composite index data for city '{city}'"
        )));
    }
    Ok(Json(panels))
}

pub(crate) async fn city_combined_indicators(
    Extension(state): Extension<AppState>,
    Path(city): Path<String>,
    Query(query): Query<YearQuery>,
) -> Result<Json<Vec<CombinedIndicator>>, AppError> {
    let panels = state.service.composite_panel(&city, query.year);
    if panels.is_empty() {
        return Err(AppError::NotFound(format!(
            "composite index data for city '{city}'"
        )));
    }
    Ok(Json(combine_indicators(panels, state.infra.as_ref())))
}

pub(crate) async fn city_report(
    Extension(state): Extension<AppState>,
    Path(city): Path<String>,
) -> Result<Json<MunicipalityReport>, AppError> {
    state
        .service
        .city_report(&city)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("city '{city}'")))
}

pub(crate) async fn school_report(
    Extension(state): Extension<AppState>,
    Path(school_id): Path<String>,
    Query(query): Query<StageQuery>,
) -> Result<Json<SchoolReport>, AppError> {
    let stage = query
        .stage
        .as_deref()
        .map(str::parse::<Stage>)
        .transpose()
        .map_err(|err| AppError::BadRequest(err.to_string()))?;

    state
        .service
        .school_report(&school_id, stage)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("school '{school_id}'")))
}

pub(crate) async fn municipality_report(
    Extension(state): Extension<AppState>,
    Path(code): Path<String>,
) -> Result<Json<MunicipalityReport>, AppError> {
    state
        .service
        .municipality_report(&code)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("municipality '{code}'")))
}
