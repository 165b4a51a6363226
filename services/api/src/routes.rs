use crate::infra::AppState;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use demand_intel::access::{AdminRole, SessionToken};
use demand_intel::intelligence::{
    intelligence_router, DemandIntelligenceService, SettingsStore, SignalRepository,
    SupplierDirectory,
};

const VIEW_TOKEN_HEADER: &str = "x-view-token";

pub(crate) fn with_demand_routes<R, S, P>(
    service: Arc<DemandIntelligenceService<R, S, P>>,
) -> axum::Router
where
    R: SignalRepository + 'static,
    S: SettingsStore + 'static,
    P: SupplierDirectory + 'static,
{
    intelligence_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/admin/view/unlock",
            axum::routing::post(view_unlock_endpoint),
        )
        .route(
            "/api/v1/admin/view/session",
            axum::routing::get(view_session_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct ViewUnlockRequest {
    role: AdminRole,
    secret: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ViewUnlockResponse {
    token: SessionToken,
    role: AdminRole,
}

pub(crate) async fn view_unlock_endpoint(
    Extension(state): Extension<AppState>,
    Json(request): Json<ViewUnlockRequest>,
) -> Response {
    match state.view_gate.unlock(request.role, &request.secret, Utc::now()) {
        Ok(token) => (
            StatusCode::OK,
            Json(ViewUnlockResponse {
                token,
                role: request.role,
            }),
        )
            .into_response(),
        Err(error) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
    }
}

pub(crate) async fn view_session_endpoint(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
) -> Response {
    let token = headers
        .get(VIEW_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| SessionToken(value.to_string()));

    let Some(token) = token else {
        let payload = json!({ "error": format!("missing {VIEW_TOKEN_HEADER} header") });
        return (StatusCode::UNAUTHORIZED, Json(payload)).into_response();
    };

    match state.view_gate.authorize(&token, Utc::now()) {
        Ok(role) => (StatusCode::OK, Json(json!({ "role": role }))).into_response(),
        Err(error) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
    }
}
