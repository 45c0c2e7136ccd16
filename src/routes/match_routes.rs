use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::match_dto::{CompleteMatchPayload, CreateMatchRequestPayload, ScheduleRequestPayload},
    error::Result,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/matching/requests",
    request_body = CreateMatchRequestPayload,
    responses(
        (status = 201, description = "Match request created or refreshed"),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn create_match_request(
    State(state): State<AppState>,
    Json(payload): Json<CreateMatchRequestPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let request = state.match_service.create_request(payload).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[utoipa::path(
    get,
    path = "/api/matching/requests/{id}",
    params(("id" = Uuid, Path, description = "Match request ID")),
    responses(
        (status = 200, description = "Match request found"),
        (status = 404, description = "Match request not found")
    )
)]
#[axum::debug_handler]
pub async fn get_match_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let request = state.match_service.get_request(id).await?;
    Ok(Json(request))
}

#[utoipa::path(
    get,
    path = "/api/matching/requests/{id}/preview",
    params(("id" = Uuid, Path, description = "Match request ID")),
    responses(
        (status = 200, description = "Ranked interviewer previews"),
        (status = 404, description = "Match request not found")
    )
)]
#[axum::debug_handler]
pub async fn preview_match_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let preview = state.match_service.preview(id).await?;
    Ok(Json(preview))
}

#[utoipa::path(
    post,
    path = "/api/matching/requests/{id}/schedule",
    params(("id" = Uuid, Path, description = "Match request ID")),
    request_body = ScheduleRequestPayload,
    responses(
        (status = 200, description = "Request scheduled onto the slot"),
        (status = 404, description = "Request or availability not found"),
        (status = 409, description = "Request not queued or slot unavailable")
    )
)]
#[axum::debug_handler]
pub async fn schedule_match_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ScheduleRequestPayload>,
) -> Result<impl IntoResponse> {
    let scheduled = state
        .match_service
        .schedule(id, payload.availability_id)
        .await?;
    Ok(Json(scheduled))
}

#[utoipa::path(
    post,
    path = "/api/matching/matches/{id}/complete",
    params(("id" = Uuid, Path, description = "Interview match ID")),
    request_body = CompleteMatchPayload,
    responses(
        (status = 200, description = "Summary attached, request completed"),
        (status = 404, description = "Interview match not found"),
        (status = 409, description = "Request not in a completable state")
    )
)]
#[axum::debug_handler]
pub async fn complete_match(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CompleteMatchPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let completed = state.match_service.complete(id, payload).await?;
    Ok(Json(completed))
}

#[axum::debug_handler]
pub async fn cancel_match_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let request = state.match_service.cancel(id).await?;
    Ok(Json(request))
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct CompletedQuery {
    pub limit: Option<i64>,
}

#[axum::debug_handler]
pub async fn list_recent_completed(
    State(state): State<AppState>,
    Path(interviewer_id): Path<Uuid>,
    Query(query): Query<CompletedQuery>,
) -> Result<impl IntoResponse> {
    let matches = state
        .match_service
        .list_recent_completed(interviewer_id, query.limit.unwrap_or(20))
        .await?;
    Ok(Json(matches))
}
