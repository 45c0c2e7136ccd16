pub mod availability;
pub mod events_stream;
pub mod health;
pub mod match_routes;
pub mod notification_routes;
pub mod profile_routes;
pub mod session_routes;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::config::get_config;
use crate::middleware::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::AppState;

/// Full application router, shared between the binary and the API tests.
/// The whole surface sits behind a fixed-window rate limit sized from
/// config.
pub fn build_router(state: AppState) -> Router {
    let limiter = RateLimiter::new(get_config().api_rps);
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/matching/requests",
            post(match_routes::create_match_request),
        )
        .route(
            "/api/matching/requests/:id",
            get(match_routes::get_match_request),
        )
        .route(
            "/api/matching/requests/:id/preview",
            get(match_routes::preview_match_request),
        )
        .route(
            "/api/matching/requests/:id/schedule",
            post(match_routes::schedule_match_request),
        )
        .route(
            "/api/matching/requests/:id/cancel",
            post(match_routes::cancel_match_request),
        )
        .route(
            "/api/matching/matches/:id/complete",
            post(match_routes::complete_match),
        )
        .route(
            "/api/matching/interviewers/:id/completed",
            get(match_routes::list_recent_completed),
        )
        .route("/api/availability", post(availability::create_availability))
        .route(
            "/api/availability/:id",
            delete(availability::delete_availability),
        )
        .route(
            "/api/availability/interviewer/:id",
            get(availability::list_interviewer_availability),
        )
        .route("/api/availability/:id/join", post(availability::join_slot))
        .route("/api/availability/:id/leave", post(availability::leave_slot))
        .route(
            "/api/sessions",
            get(session_routes::list_sessions).post(session_routes::create_session),
        )
        .route(
            "/api/sessions/:id",
            get(session_routes::get_session).delete(session_routes::delete_session),
        )
        .route("/api/sessions/:id/join", post(session_routes::join_session))
        .route(
            "/api/sessions/:id/leave",
            post(session_routes::leave_session),
        )
        .route(
            "/api/sessions/:id/heartbeat",
            post(session_routes::heartbeat_session),
        )
        .route(
            "/api/sessions/:id/status",
            patch(session_routes::update_session_status),
        )
        .route(
            "/api/notifications/:user_id",
            get(notification_routes::list_notifications),
        )
        .route(
            "/api/notifications/:id/read",
            post(notification_routes::mark_notification_read),
        )
        .route(
            "/api/profiles/candidates",
            post(profile_routes::create_candidate),
        )
        .route(
            "/api/profiles/candidates/:id",
            get(profile_routes::get_candidate),
        )
        .route(
            "/api/profiles/interviewers",
            post(profile_routes::create_interviewer),
        )
        .route(
            "/api/profiles/interviewers/:id",
            get(profile_routes::get_interviewer),
        )
        .route("/api/events/stream", get(events_stream::stream_events))
        .layer(axum::middleware::from_fn_with_state(
            limiter,
            rate_limit_middleware,
        ))
        .with_state(state)
}
