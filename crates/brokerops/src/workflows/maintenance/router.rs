use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response, routing::post, Router};
use axum::response::IntoResponse;
use chrono::Local;

use super::sweep::MaintenanceSweep;
use crate::workflows::events::EventPublisher;
use crate::workflows::incidents::IncidentStore;
use crate::workflows::reliability::{AccountDirectory, FlagStore};

/// Router builder exposing the sweep trigger for external schedulers.
pub fn maintenance_router<I, F, A, E>(sweep: Arc<MaintenanceSweep<I, F, A, E>>) -> Router
where
    I: IncidentStore + 'static,
    F: FlagStore + 'static,
    A: AccountDirectory + 'static,
    E: EventPublisher + 'static,
{
    Router::new()
        .route("/api/v1/maintenance/sweep", post(sweep_handler::<I, F, A, E>))
        .with_state(sweep)
}

pub(crate) async fn sweep_handler<I, F, A, E>(
    State(sweep): State<Arc<MaintenanceSweep<I, F, A, E>>>,
) -> Response
where
    I: IncidentStore + 'static,
    F: FlagStore + 'static,
    A: AccountDirectory + 'static,
    E: EventPublisher + 'static,
{
    let report = sweep.run(Local::now().naive_local());
    (StatusCode::OK, axum::Json(report)).into_response()
}
