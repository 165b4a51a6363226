use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;

use super::domain::{RequirementRecord, SignalId, SignalSubmission};
use super::repository::{
    RepositoryError, SettingsStore, SignalQuery, SignalRepository, SignalView, SupplierDirectory,
};
use super::service::{DemandIntelligenceService, IntelligenceServiceError};
use super::settings::DecisionSettings;

/// Router builder exposing the demand-intelligence HTTP surface.
pub fn intelligence_router<R, S, P>(service: Arc<DemandIntelligenceService<R, S, P>>) -> Router
where
    R: SignalRepository + 'static,
    S: SettingsStore + 'static,
    P: SupplierDirectory + 'static,
{
    Router::new()
        .route(
            "/api/v1/demand/signals",
            get(list_handler::<R, S, P>).post(ingest_handler::<R, S, P>),
        )
        .route(
            "/api/v1/demand/signals/:signal_id/approve",
            post(approve_handler::<R, S, P>),
        )
        .route(
            "/api/v1/demand/signals/:signal_id/ignore",
            post(ignore_handler::<R, S, P>),
        )
        .route(
            "/api/v1/demand/settings",
            get(settings_handler::<R, S, P>).put(update_settings_handler::<R, S, P>),
        )
        .route("/api/v1/demand/metrics", get(metrics_handler::<R, S, P>))
        .with_state(service)
}

#[derive(Debug, Serialize)]
struct ApprovalResponse {
    signal: SignalView,
    requirement: RequirementRecord,
}

async fn ingest_handler<R, S, P>(
    State(service): State<Arc<DemandIntelligenceService<R, S, P>>>,
    Json(submission): Json<SignalSubmission>,
) -> Response
where
    R: SignalRepository + 'static,
    S: SettingsStore + 'static,
    P: SupplierDirectory + 'static,
{
    match service.ingest(submission) {
        Ok(signal) => {
            let view = SignalView::from_signal(&signal);
            (StatusCode::ACCEPTED, Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

async fn list_handler<R, S, P>(
    State(service): State<Arc<DemandIntelligenceService<R, S, P>>>,
    Query(query): Query<SignalQuery>,
) -> Response
where
    R: SignalRepository + 'static,
    S: SettingsStore + 'static,
    P: SupplierDirectory + 'static,
{
    match service.list(&query) {
        Ok(signals) => {
            let views: Vec<SignalView> = signals.iter().map(SignalView::from_signal).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

async fn approve_handler<R, S, P>(
    State(service): State<Arc<DemandIntelligenceService<R, S, P>>>,
    Path(signal_id): Path<String>,
) -> Response
where
    R: SignalRepository + 'static,
    S: SettingsStore + 'static,
    P: SupplierDirectory + 'static,
{
    let id = SignalId(signal_id);
    match service.approve(&id) {
        Ok((signal, requirement)) => {
            let body = ApprovalResponse {
                signal: SignalView::from_signal(&signal),
                requirement,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(error) => error_response(error),
    }
}

async fn ignore_handler<R, S, P>(
    State(service): State<Arc<DemandIntelligenceService<R, S, P>>>,
    Path(signal_id): Path<String>,
) -> Response
where
    R: SignalRepository + 'static,
    S: SettingsStore + 'static,
    P: SupplierDirectory + 'static,
{
    let id = SignalId(signal_id);
    match service.dismiss(&id) {
        Ok(signal) => {
            let view = SignalView::from_signal(&signal);
            (StatusCode::OK, Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

async fn settings_handler<R, S, P>(
    State(service): State<Arc<DemandIntelligenceService<R, S, P>>>,
) -> Response
where
    R: SignalRepository + 'static,
    S: SettingsStore + 'static,
    P: SupplierDirectory + 'static,
{
    match service.settings() {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn update_settings_handler<R, S, P>(
    State(service): State<Arc<DemandIntelligenceService<R, S, P>>>,
    Json(settings): Json<DecisionSettings>,
) -> Response
where
    R: SignalRepository + 'static,
    S: SettingsStore + 'static,
    P: SupplierDirectory + 'static,
{
    match service.update_settings(settings) {
        Ok(saved) => (StatusCode::OK, Json(saved)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn metrics_handler<R, S, P>(
    State(service): State<Arc<DemandIntelligenceService<R, S, P>>>,
) -> Response
where
    R: SignalRepository + 'static,
    S: SettingsStore + 'static,
    P: SupplierDirectory + 'static,
{
    match service.metrics() {
        Ok(metrics) => (StatusCode::OK, Json(metrics)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: IntelligenceServiceError) -> Response {
    let status = match &error {
        IntelligenceServiceError::Settings(_)
        | IntelligenceServiceError::CategoryNotEnabled(_)
        | IntelligenceServiceError::CountryNotEnabled(_) => StatusCode::UNPROCESSABLE_ENTITY,
        IntelligenceServiceError::InvalidTransition { .. } => StatusCode::CONFLICT,
        IntelligenceServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        IntelligenceServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        IntelligenceServiceError::Repository(RepositoryError::Unavailable(_))
        | IntelligenceServiceError::Directory(_) => StatusCode::SERVICE_UNAVAILABLE,
    };

    let body = Json(json!({ "error": error.to_string() }));
    (status, body).into_response()
}
