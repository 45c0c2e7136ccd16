use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::{
    dto::session_dto::{
        CreateSessionPayload, HeartbeatPayload, JoinSessionPayload, LeaveSessionPayload,
        SessionListQuery, UpdateSessionStatusPayload,
    },
    error::Result,
    AppState,
};

#[axum::debug_handler]
pub async fn create_session(
    State(state): State<AppState>,
    Json(payload): Json<CreateSessionPayload>,
) -> Result<impl IntoResponse> {
    let snapshot = state.session_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

#[axum::debug_handler]
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<SessionListQuery>,
) -> Result<impl IntoResponse> {
    let sessions = state.session_service.list(query).await?;
    Ok(Json(sessions))
}

#[axum::debug_handler]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let snapshot = state.session_service.snapshot(id).await?;
    Ok(Json(snapshot))
}

#[axum::debug_handler]
pub async fn join_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<JoinSessionPayload>,
) -> Result<impl IntoResponse> {
    let snapshot = state.session_service.join(id, payload).await?;
    Ok(Json(snapshot))
}

#[axum::debug_handler]
pub async fn leave_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LeaveSessionPayload>,
) -> Result<impl IntoResponse> {
    let snapshot = state.session_service.leave(id, payload).await?;
    Ok(Json(snapshot))
}

#[axum::debug_handler]
pub async fn heartbeat_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<HeartbeatPayload>,
) -> Result<impl IntoResponse> {
    let snapshot = state.session_service.heartbeat(id, payload).await?;
    Ok(Json(snapshot))
}

#[axum::debug_handler]
pub async fn update_session_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSessionStatusPayload>,
) -> Result<impl IntoResponse> {
    let snapshot = state.session_service.update_status(id, payload).await?;
    Ok(Json(snapshot))
}

#[axum::debug_handler]
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.session_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
