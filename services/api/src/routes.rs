use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;

use crate::infra::{AppState, Desk, Reporter, Sweep, Workflow};
use brokerops::workflows::duplicates::duplicate_router;
use brokerops::workflows::incidents::incident_router;
use brokerops::workflows::maintenance::maintenance_router;
use brokerops::workflows::reliability::reliability_router;

pub(crate) fn trust_routes(
    workflow: Arc<Workflow>,
    desk: Arc<Desk>,
    sweep: Arc<Sweep>,
    reporter: Arc<Reporter>,
) -> axum::Router {
    duplicate_router(workflow)
        .merge(incident_router(desk))
        .merge(maintenance_router(sweep))
        .merge(reliability_router(reporter))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
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
