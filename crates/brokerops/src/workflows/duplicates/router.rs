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

use super::domain::{DuplicateReviewTicket, NewListing, ReviewDecision, TicketId};
use super::repository::{ListingStore, RepositoryError, TicketStore};
use super::service::{DuplicateWorkflow, DuplicateWorkflowError};
use crate::workflows::events::EventPublisher;
use crate::workflows::ids::ReviewerId;

/// Router builder exposing the duplicate detection and review endpoints.
pub fn duplicate_router<L, T, E>(service: Arc<DuplicateWorkflow<L, T, E>>) -> Router
where
    L: ListingStore + 'static,
    T: TicketStore + 'static,
    E: EventPublisher + 'static,
{
    Router::new()
        .route("/api/v1/listings", post(register_listing_handler::<L, T, E>))
        .route(
            "/api/v1/listings/:listing_id/duplicate-scan",
            post(scan_handler::<L, T, E>),
        )
        .route(
            "/api/v1/duplicates/review-queue",
            get(review_queue_handler::<L, T, E>),
        )
        .route(
            "/api/v1/duplicates/review-queue/:ticket_id/resolution",
            post(resolve_handler::<L, T, E>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResolutionRequest {
    pub(crate) resolver_id: u64,
    pub(crate) decision: ReviewDecision,
    #[serde(default)]
    pub(crate) notes: Option<String>,
}

fn ticket_view(ticket: &DuplicateReviewTicket) -> serde_json::Value {
    json!({
        "ticket_id": ticket.id,
        "listing_id": ticket.listing_id,
        "matched_listing_id": ticket.matched_listing_id,
        "similarity": ticket.similarity,
        "auto_hidden": ticket.auto_hidden,
        "status": ticket.status.label(),
        "decision": ticket.decision.map(ReviewDecision::label),
        "notes": ticket.notes,
    })
}

fn error_response(err: DuplicateWorkflowError) -> Response {
    let status = match &err {
        DuplicateWorkflowError::MissingCity => StatusCode::UNPROCESSABLE_ENTITY,
        DuplicateWorkflowError::TicketAlreadyResolved => StatusCode::CONFLICT,
        DuplicateWorkflowError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        DuplicateWorkflowError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, axum::Json(json!({ "error": err.to_string() }))).into_response()
}

pub(crate) async fn register_listing_handler<L, T, E>(
    State(service): State<Arc<DuplicateWorkflow<L, T, E>>>,
    axum::Json(new): axum::Json<NewListing>,
) -> Response
where
    L: ListingStore + 'static,
    T: TicketStore + 'static,
    E: EventPublisher + 'static,
{
    match service.register_listing(new, Local::now().naive_local()) {
        Ok((listing, outcome)) => (
            StatusCode::CREATED,
            axum::Json(json!({
                "listing_id": listing.id,
                "status": listing.status.label(),
                "hidden_from_customers": listing.hidden_from_customers,
                "outcome": outcome,
            })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn scan_handler<L, T, E>(
    State(service): State<Arc<DuplicateWorkflow<L, T, E>>>,
    Path(listing_id): Path<u64>,
) -> Response
where
    L: ListingStore + 'static,
    T: TicketStore + 'static,
    E: EventPublisher + 'static,
{
    match service.scan_listing(
        super::domain::ListingId(listing_id),
        Local::now().naive_local(),
    ) {
        Ok(outcome) => (StatusCode::OK, axum::Json(json!({ "outcome": outcome }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn review_queue_handler<L, T, E>(
    State(service): State<Arc<DuplicateWorkflow<L, T, E>>>,
) -> Response
where
    L: ListingStore + 'static,
    T: TicketStore + 'static,
    E: EventPublisher + 'static,
{
    match service.pending_tickets() {
        Ok(tickets) => {
            let items: Vec<_> = tickets.iter().map(ticket_view).collect();
            (StatusCode::OK, axum::Json(json!({ "items": items }))).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn resolve_handler<L, T, E>(
    State(service): State<Arc<DuplicateWorkflow<L, T, E>>>,
    Path(ticket_id): Path<u64>,
    axum::Json(request): axum::Json<ResolutionRequest>,
) -> Response
where
    L: ListingStore + 'static,
    T: TicketStore + 'static,
    E: EventPublisher + 'static,
{
    match service.resolve_ticket(
        TicketId(ticket_id),
        ReviewerId(request.resolver_id),
        request.decision,
        request.notes,
        Local::now().naive_local(),
    ) {
        Ok(ticket) => (StatusCode::OK, axum::Json(ticket_view(&ticket))).into_response(),
        Err(err) => error_response(err),
    }
}
