use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
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
async fn matching_flow_end_to_end() {
    dotenvy::dotenv().ok();
    let Ok(_) = env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping matching flow test");
        return;
    };
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::remove_var("MATCH_WEBHOOK_URL");
    env::remove_var("ROOM_BASE_URL");
    let _ = matching_backend::config::init_config();

    let pool = matching_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations").run(&pool).await.expect("migrations");

    let app = routes::build_router(AppState::new(pool.clone(), EventBus::new(64)));

    // Unique profession and focus area keep this run's pairing unambiguous
    // even when other test data is present.
    let profession = format!("Backend Engineer {}", Uuid::new_v4());
    let focus = format!("distributed-systems-{}", Uuid::new_v4());
    let candidate_user = Uuid::new_v4();

    let (status, interviewer) = request(
        &app,
        "POST",
        "/api/profiles/interviewers",
        Some(json!({
            "user_id": Uuid::new_v4(),
            "display_name": "Iris Interviewer",
            "profession": profession,
            "timezone": "UTC",
            "experience_years": 9,
            "languages": ["English"],
            "specializations": [focus, "apis"],
            "rating": 4.8
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let interviewer_id = interviewer["id"].as_str().unwrap().to_string();

    let (status, candidate) = request(
        &app,
        "POST",
        "/api/profiles/candidates",
        Some(json!({
            "user_id": candidate_user,
            "display_name": "Casey Candidate",
            "profession": profession,
            "timezone": "UTC",
            "experience_years": 3,
            "languages": ["English"],
            "focus_areas": [focus]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let candidate_id = candidate["id"].as_str().unwrap().to_string();

    let start_at = Utc::now() + Duration::hours(2);
    let end_at = start_at + Duration::hours(1);
    let (status, slot) = request(
        &app,
        "POST",
        "/api/availability",
        Some(json!({
            "interviewer_id": interviewer_id,
            "start_at": start_at,
            "end_at": end_at,
            "capacity": 1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let slot_id = slot["slot"]["id"].as_str().unwrap().to_string();

    let (status, created) = request(
        &app,
        "POST",
        "/api/matching/requests",
        Some(json!({
            "candidate_id": candidate_id,
            "target_role": profession,
            "focus_areas": [focus],
            "preferred_languages": ["English"],
            "session_format": "system_design"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "queued");
    let request_id = created["id"].as_str().unwrap().to_string();

    let (status, fetched) = request(
        &app,
        "GET",
        &format!("/api/matching/requests/{}", request_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], created["id"]);

    // Every signal aligns, so our interviewer must rank first at 100%.
    let (status, preview) = request(
        &app,
        "GET",
        &format!("/api/matching/requests/{}/preview", request_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let results = preview["results"].as_array().unwrap();
    assert!(!results.is_empty());
    let top = &results[0];
    assert_eq!(top["interviewer"]["id"].as_str().unwrap(), interviewer_id);
    assert_eq!(top["score"]["percentage"], 100);
    assert_eq!(top["score"]["meets_threshold"], true);
    assert!(top["availability"]
        .as_array()
        .unwrap()
        .iter()
        .any(|s| s["id"].as_str().unwrap() == slot_id));

    let (status, scheduled) = request(
        &app,
        "POST",
        &format!("/api/matching/requests/{}/schedule", request_id),
        Some(json!({ "availability_id": slot_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(scheduled["request"]["status"], "scheduled");
    assert_eq!(
        scheduled["match"]["interviewer_id"].as_str().unwrap(),
        interviewer_id
    );
    let match_id = scheduled["match"]["id"].as_str().unwrap().to_string();

    // A scheduled request cannot be scheduled again.
    let (status, _) = request(
        &app,
        "POST",
        &format!("/api/matching/requests/{}/schedule", request_id),
        Some(json!({ "availability_id": slot_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, notifications) = request(
        &app,
        "GET",
        &format!("/api/notifications/{}", candidate_user),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let notifications = notifications.as_array().unwrap().clone();
    assert!(!notifications.is_empty());
    assert_eq!(notifications[0]["kind"], "match_scheduled");
    let notification_id = notifications[0]["id"].as_str().unwrap().to_string();

    let (status, read) = request(
        &app,
        "POST",
        &format!("/api/notifications/{}/read", notification_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!read["read_at"].is_null());

    let (status, completed) = request(
        &app,
        "POST",
        &format!("/api/matching/matches/{}/complete", match_id),
        Some(json!({
            "interviewer_notes": "Strong fundamentals, shaky on tradeoffs",
            "strengths": ["api design"],
            "improvements": ["capacity estimation"],
            "rating": 4,
            "effectiveness_score": 82
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["request"]["status"], "completed");
    assert_eq!(completed["match"]["effectiveness_score"], 82);

    let (status, history) = request(
        &app,
        "GET",
        &format!("/api/matching/interviewers/{}/completed", interviewer_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(history
        .as_array()
        .unwrap()
        .iter()
        .any(|m| m["id"].as_str().unwrap() == match_id));
}

#[tokio::test]
async fn cancel_is_terminal() {
    dotenvy::dotenv().ok();
    let Ok(_) = env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping cancel test");
        return;
    };
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    let _ = matching_backend::config::init_config();

    let pool = matching_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations").run(&pool).await.expect("migrations");

    let app = routes::build_router(AppState::new(pool, EventBus::new(16)));

    let (status, candidate) = request(
        &app,
        "POST",
        "/api/profiles/candidates",
        Some(json!({
            "user_id": null,
            "display_name": "Quinn Quitter",
            "profession": "Data Engineer",
            "timezone": "UTC",
            "experience_years": 2
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let candidate_id = candidate["id"].as_str().unwrap().to_string();

    let (status, created) = request(
        &app,
        "POST",
        "/api/matching/requests",
        Some(json!({
            "candidate_id": candidate_id,
            "target_role": "Data Engineer",
            "session_format": "coding"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let request_id = created["id"].as_str().unwrap().to_string();

    let (status, cancelled) = request(
        &app,
        "POST",
        &format!("/api/matching/requests/{}/cancel", request_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");

    let (status, _) = request(
        &app,
        "POST",
        &format!("/api/matching/requests/{}/cancel", request_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
