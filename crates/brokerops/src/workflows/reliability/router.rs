use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::json;

use super::report::{ReliabilityReporter, ReportError};
use super::repository::{AccountDirectory, FlagStore};
use crate::workflows::events::EventPublisher;
use crate::workflows::ids::BrokerId;
use crate::workflows::incidents::IncidentStore;

/// Router builder exposing broker flag sheets and the reliability report.
pub fn reliability_router<F, A, E, I>(reporter: Arc<ReliabilityReporter<F, A, E, I>>) -> Router
where
    F: FlagStore + 'static,
    A: AccountDirectory + 'static,
    E: EventPublisher + 'static,
    I: IncidentStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/brokers/:broker_id/flags",
            get(flag_sheet_handler::<F, A, E, I>),
        )
        .route(
            "/api/v1/reports/broker-reliability",
            get(report_handler::<F, A, E, I>),
        )
        .route(
            "/api/v1/reports/broker-reliability.csv",
            get(report_csv_handler::<F, A, E, I>),
        )
        .with_state(reporter)
}

fn error_response(err: ReportError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        axum::Json(json!({ "error": err.to_string() })),
    )
        .into_response()
}

pub(crate) async fn flag_sheet_handler<F, A, E, I>(
    State(reporter): State<Arc<ReliabilityReporter<F, A, E, I>>>,
    Path(broker_id): Path<u64>,
) -> Response
where
    F: FlagStore + 'static,
    A: AccountDirectory + 'static,
    E: EventPublisher + 'static,
    I: IncidentStore + 'static,
{
    match reporter.flag_sheet(BrokerId(broker_id)) {
        Ok(sheet) => (StatusCode::OK, axum::Json(sheet)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn report_handler<F, A, E, I>(
    State(reporter): State<Arc<ReliabilityReporter<F, A, E, I>>>,
) -> Response
where
    F: FlagStore + 'static,
    A: AccountDirectory + 'static,
    E: EventPublisher + 'static,
    I: IncidentStore + 'static,
{
    match reporter.broker_report() {
        Ok(rows) => (StatusCode::OK, axum::Json(json!({ "items": rows }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn report_csv_handler<F, A, E, I>(
    State(reporter): State<Arc<ReliabilityReporter<F, A, E, I>>>,
) -> Response
where
    F: FlagStore + 'static,
    A: AccountDirectory + 'static,
    E: EventPublisher + 'static,
    I: IncidentStore + 'static,
{
    match reporter.broker_report_csv() {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"broker_reliability.csv\"",
                ),
            ],
            csv,
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}
