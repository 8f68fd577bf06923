use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::{build_desk, dt};
use crate::workflows::incidents::router::incident_router;

fn post_json(uri: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

async fn read_json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[tokio::test]
async fn cancellation_intake_and_rm_review_round_trip() {
    let harness = build_desk();
    let app = incident_router(Arc::new(harness.desk));

    let payload = json!({
        "visit_id": 900,
        "slot_id": 300,
        "broker_id": 5,
        "raised_at": dt(3, 10),
        "within_24h": true,
        "was_booked": true,
        "emergency": { "reason": "Hospitalized overnight", "details": "" }
    });
    let response = app
        .clone()
        .oneshot(post_json("/api/v1/cancellations", &payload))
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["incident"]["status"], "pending_rm_review");
    let incident_id = body["incident"]["incident_id"].as_u64().expect("id");

    let review = json!({ "reviewer_id": 21, "approve": true, "note": "verified" });
    let uri = format!("/api/v1/incidents/{incident_id}/rm-review");
    let response = app
        .clone()
        .oneshot(post_json(&uri, &review))
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["incident"]["status"], "approved_emergency");

    let response = app
        .oneshot(post_json(&uri, &review))
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn uneventful_cancellation_returns_no_incident() {
    let harness = build_desk();
    let app = incident_router(Arc::new(harness.desk));

    let payload = json!({
        "visit_id": 901,
        "slot_id": 301,
        "broker_id": 5,
        "raised_at": dt(3, 10),
        "within_24h": false,
        "was_booked": true
    });
    let response = app
        .oneshot(post_json("/api/v1/cancellations", &payload))
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert!(body["incident"].is_null());
}
