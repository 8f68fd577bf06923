use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use super::domain::{CancellationIncident, CancellationNotice, IncidentId};
use super::repository::{IncidentStore, RepositoryError};
use super::service::{IncidentDesk, IncidentDeskError, IncidentReceipt};
use crate::workflows::events::EventPublisher;
use crate::workflows::ids::ReviewerId;
use crate::workflows::reliability::{AccountDirectory, FlagStore};

/// Router builder exposing cancellation intake and the review queues.
pub fn incident_router<I, F, A, E>(desk: Arc<IncidentDesk<I, F, A, E>>) -> Router
where
    I: IncidentStore + 'static,
    F: FlagStore + 'static,
    A: AccountDirectory + 'static,
    E: EventPublisher + 'static,
{
    Router::new()
        .route("/api/v1/cancellations", post(report_handler::<I, F, A, E>))
        .route(
            "/api/v1/incidents/rm-queue",
            get(rm_queue_handler::<I, F, A, E>),
        )
        .route(
            "/api/v1/incidents/:incident_id/rm-review",
            post(rm_review_handler::<I, F, A, E>),
        )
        .route(
            "/api/v1/incidents/srm-queue",
            get(srm_queue_handler::<I, F, A, E>),
        )
        .route(
            "/api/v1/incidents/:incident_id/srm-review",
            post(srm_review_handler::<I, F, A, E>),
        )
        .with_state(desk)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewRequest {
    pub(crate) reviewer_id: u64,
    pub(crate) approve: bool,
    #[serde(default)]
    pub(crate) note: Option<String>,
}

fn incident_view(incident: &CancellationIncident) -> serde_json::Value {
    json!({
        "incident_id": incident.id,
        "visit_id": incident.visit_id,
        "slot_id": incident.slot_id,
        "broker_id": incident.broker_id,
        "status": incident.status.label(),
        "raised_at": incident.raised_at,
        "sla_due_at": incident.sla_due_at,
        "escalated_to_srm": incident.escalated_to_srm,
        "srm_due_at": incident.srm_due_at,
        "priority_rebook_until": incident.priority_rebook_until,
        "resolved_at": incident.resolved_at,
    })
}

fn receipt_view(receipt: &IncidentReceipt) -> serde_json::Value {
    json!({
        "incident": incident_view(&receipt.incident),
        "flag": receipt.flag,
    })
}

fn error_response(err: IncidentDeskError) -> Response {
    let status = match &err {
        IncidentDeskError::EmptyEmergencyReason => StatusCode::UNPROCESSABLE_ENTITY,
        IncidentDeskError::StaleState { .. } => StatusCode::CONFLICT,
        IncidentDeskError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, axum::Json(json!({ "error": err.to_string() }))).into_response()
}

pub(crate) async fn report_handler<I, F, A, E>(
    State(desk): State<Arc<IncidentDesk<I, F, A, E>>>,
    axum::Json(notice): axum::Json<CancellationNotice>,
) -> Response
where
    I: IncidentStore + 'static,
    F: FlagStore + 'static,
    A: AccountDirectory + 'static,
    E: EventPublisher + 'static,
{
    match desk.report_cancellation(notice) {
        Ok(Some(receipt)) => (StatusCode::CREATED, axum::Json(receipt_view(&receipt))).into_response(),
        Ok(None) => (
            StatusCode::OK,
            axum::Json(json!({ "incident": serde_json::Value::Null })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn rm_queue_handler<I, F, A, E>(
    State(desk): State<Arc<IncidentDesk<I, F, A, E>>>,
) -> Response
where
    I: IncidentStore + 'static,
    F: FlagStore + 'static,
    A: AccountDirectory + 'static,
    E: EventPublisher + 'static,
{
    match desk.rm_queue() {
        Ok(incidents) => queue_response(&incidents),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn srm_queue_handler<I, F, A, E>(
    State(desk): State<Arc<IncidentDesk<I, F, A, E>>>,
) -> Response
where
    I: IncidentStore + 'static,
    F: FlagStore + 'static,
    A: AccountDirectory + 'static,
    E: EventPublisher + 'static,
{
    match desk.srm_queue() {
        Ok(incidents) => queue_response(&incidents),
        Err(err) => error_response(err),
    }
}

fn queue_response(incidents: &[CancellationIncident]) -> Response {
    let items: Vec<_> = incidents.iter().map(incident_view).collect();
    (StatusCode::OK, axum::Json(json!({ "items": items }))).into_response()
}

pub(crate) async fn rm_review_handler<I, F, A, E>(
    State(desk): State<Arc<IncidentDesk<I, F, A, E>>>,
    Path(incident_id): Path<u64>,
    axum::Json(request): axum::Json<ReviewRequest>,
) -> Response
where
    I: IncidentStore + 'static,
    F: FlagStore + 'static,
    A: AccountDirectory + 'static,
    E: EventPublisher + 'static,
{
    match desk.review_by_rm(
        IncidentId(incident_id),
        ReviewerId(request.reviewer_id),
        request.approve,
        request.note,
        Local::now().naive_local(),
    ) {
        Ok(receipt) => (StatusCode::OK, axum::Json(receipt_view(&receipt))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn srm_review_handler<I, F, A, E>(
    State(desk): State<Arc<IncidentDesk<I, F, A, E>>>,
    Path(incident_id): Path<u64>,
    axum::Json(request): axum::Json<ReviewRequest>,
) -> Response
where
    I: IncidentStore + 'static,
    F: FlagStore + 'static,
    A: AccountDirectory + 'static,
    E: EventPublisher + 'static,
{
    match desk.review_by_srm(
        IncidentId(incident_id),
        ReviewerId(request.reviewer_id),
        request.approve,
        request.note,
        Local::now().naive_local(),
    ) {
        Ok(receipt) => (StatusCode::OK, axum::Json(receipt_view(&receipt))).into_response(),
        Err(err) => error_response(err),
    }
}
