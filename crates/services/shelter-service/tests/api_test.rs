//! HTTP API tests.
//!
//! The router runs against an in-memory SQLite database; requests go through
//! `tower::ServiceExt::oneshot` without binding a socket.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use common::DatabaseConfig;
use shelter_service_lib::api::{create_router, AppState};
use shelter_service_lib::infra::Database;

async fn app() -> Router {
    let db = Database::connect(&DatabaseConfig::sqlite_memory())
        .await
        .expect("in-memory database");
    create_router(AppState::from_database(db))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create_shelter(app: &Router, name: &str, capacity: i32) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/shelters",
        Some(json!({ "name": name, "capacity": capacity })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn register_person(app: &Router, name: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/people",
        Some(json!({ "name": name, "national_id": Uuid::new_v4().simple().to_string() })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_reports_database() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["services"]["database"]["status"], "healthy");
}

#[tokio::test]
async fn check_in_lifecycle_over_http() {
    let app = app().await;
    let shelter_id = create_shelter(&app, "Ginasio", 1).await;
    let person_id = register_person(&app, "Ana").await;
    let other_id = register_person(&app, "Bia").await;

    let (status, created) = send(
        &app,
        "POST",
        "/check-ins",
        Some(json!({ "shelter_id": shelter_id, "person_id": person_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["state"], "active");
    assert_eq!(created["shelter"]["current_occupancy"], 1);
    let check_in_id = created["id"].as_str().unwrap().to_string();

    let (status, full) = send(
        &app,
        "POST",
        "/check-ins",
        Some(json!({ "shelter_id": shelter_id, "person_id": other_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(full["error"]["code"], "CONFLICT");

    let (status, active) = send(&app, "GET", &format!("/people/{}/check-in", person_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active["id"], check_in_id.as_str());

    let (status, closed) = send(
        &app,
        "PUT",
        &format!("/check-ins/{}", check_in_id),
        Some(json!({ "shelter_id": shelter_id, "exit_time": "2099-01-01T00:00:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["state"], "closed");
    assert_eq!(closed["shelter"]["current_occupancy"], 0);

    let (status, _) = send(&app, "GET", &format!("/people/{}/check-in", person_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, reopened) = send(
        &app,
        "PUT",
        &format!("/check-ins/{}", check_in_id),
        Some(json!({ "shelter_id": shelter_id, "exit_time": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reopened["state"], "active");

    let (status, _) = send(&app, "DELETE", &format!("/check-ins/{}", check_in_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "DELETE", &format!("/check-ins/{}", check_in_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, shelter) = send(&app, "GET", &format!("/shelters/{}", shelter_id), None).await;
    assert_eq!(shelter["current_occupancy"], 0);
}

#[tokio::test]
async fn unknown_references_are_404() {
    let app = app().await;
    let person_id = register_person(&app, "Lost").await;

    let (status, body) = send(
        &app,
        "POST",
        "/check-ins",
        Some(json!({ "shelter_id": Uuid::new_v4(), "person_id": person_id })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Shelter not found");

    let (status, _) = send(&app, "GET", &format!("/check-ins/{}", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/shelters/{}/check-ins?active=true", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_payloads_are_400() {
    let app = app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/shelters",
        Some(json!({ "name": "Zero", "capacity": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = send(&app, "POST", "/check-ins", Some(json!({ "shelter_id": "nope" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/check-ins",
        Some(json!({ "shelter_id": Uuid::nil(), "person_id": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/check-ins/{}", Uuid::new_v4()),
        Some(json!({
            "shelter_id": Uuid::new_v4(),
            "entry_time": "2024-03-02T08:00:00Z",
            "exit_time": "2024-03-01T18:30:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Exit time cannot be earlier than entry time");
}

#[tokio::test]
async fn shelter_listing_and_reconcile() {
    let app = app().await;
    let shelter_id = create_shelter(&app, "Beta", 4).await;
    create_shelter(&app, "Alpha", 2).await;
    let person_id = register_person(&app, "Caio").await;
    send(
        &app,
        "POST",
        "/check-ins",
        Some(json!({ "shelter_id": shelter_id, "person_id": person_id })),
    )
    .await;

    let (status, shelters) = send(&app, "GET", "/shelters", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shelters[0]["name"], "Alpha");
    assert_eq!(shelters[1]["name"], "Beta");

    let (status, active) = send(
        &app,
        "GET",
        &format!("/shelters/{}/check-ins?active=true", shelter_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active.as_array().map(Vec::len), Some(1));

    let (status, report) = send(
        &app,
        "POST",
        &format!("/shelters/{}/occupancy/reconcile", shelter_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["recorded"], 1);
    assert_eq!(report["actual"], 1);

    let (status, _) = send(&app, "DELETE", &format!("/shelters/{}", shelter_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}
