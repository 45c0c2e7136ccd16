use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

use matching_backend::{events::EventBus, routes, AppState};

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
    };
    (status, json)
}

#[tokio::test]
async fn session_lifecycle_end_to_end() {
    dotenvy::dotenv().ok();
    let Ok(_) = env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping session lifecycle test");
        return;
    };
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    let _ = matching_backend::config::init_config();

    let pool = matching_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations").run(&pool).await.expect("migrations");

    let app = routes::build_router(AppState::new(pool, EventBus::new(64)));

    let host = Uuid::new_v4();
    let guest = Uuid::new_v4();

    let (status, created) = request(
        &app,
        "POST",
        "/api/sessions",
        Some(json!({
            "host_id": host,
            "title": "Mock system design round",
            "connection_id": "conn-host-1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["session"]["status"], "scheduled");
    let participants = created["participants"].as_array().unwrap();
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0]["role"], "host");
    let session_id = created["session"]["id"].as_str().unwrap().to_string();

    // First join promotes the session to active.
    let (status, joined) = request(
        &app,
        "POST",
        &format!("/api/sessions/{}/join", session_id),
        Some(json!({ "user_id": guest, "role": "candidate" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["session"]["status"], "active");
    assert_eq!(joined["participants"].as_array().unwrap().len(), 2);

    let (status, beat) = request(
        &app,
        "POST",
        &format!("/api/sessions/{}/heartbeat", session_id),
        Some(json!({ "user_id": guest })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!beat["session"]["last_heartbeat"].is_null());

    let (status, left) = request(
        &app,
        "POST",
        &format!("/api/sessions/{}/leave", session_id),
        Some(json!({ "user_id": guest })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let departed = left["participants"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["user_id"].as_str() == Some(&guest.to_string()))
        .unwrap()
        .clone();
    assert!(!departed["left_at"].is_null());

    // Rejoining restores the departed participant instead of duplicating it.
    let (status, rejoined) = request(
        &app,
        "POST",
        &format!("/api/sessions/{}/join", session_id),
        Some(json!({ "user_id": guest })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejoined["participants"].as_array().unwrap().len(), 2);
    let restored = rejoined["participants"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["user_id"].as_str() == Some(&guest.to_string()))
        .unwrap();
    assert!(restored["left_at"].is_null());
    assert_eq!(restored["role"], "candidate");

    let (status, ended) = request(
        &app,
        "PATCH",
        &format!("/api/sessions/{}/status", session_id),
        Some(json!({ "status": "ended" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ended["session"]["status"], "ended");
    assert!(!ended["session"]["ended_at"].is_null());
    assert!(ended["session"]["last_heartbeat"].is_null());

    // Terminal sessions reject heartbeats, joins, and revival.
    let (status, _) = request(
        &app,
        "POST",
        &format!("/api/sessions/{}/heartbeat", session_id),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = request(
        &app,
        "POST",
        &format!("/api/sessions/{}/join", session_id),
        Some(json!({ "user_id": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = request(
        &app,
        "PATCH",
        &format!("/api/sessions/{}/status", session_id),
        Some(json!({ "status": "active" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Even a repeat of the terminal status is rejected once ended.
    let (status, _) = request(
        &app,
        "PATCH",
        &format!("/api/sessions/{}/status", session_id),
        Some(json!({ "status": "ended" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, listed) = request(
        &app,
        "GET",
        &format!("/api/sessions?host_id={}&status=ended", host),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(listed
        .as_array()
        .unwrap()
        .iter()
        .any(|s| s["id"].as_str() == Some(session_id.as_str())));

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/sessions/{}", session_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = request(&app, "GET", &format!("/api/sessions/{}", session_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
