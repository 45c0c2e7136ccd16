use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::profile_dto::{CreateCandidatePayload, CreateInterviewerPayload},
    error::Result,
    AppState,
};

#[axum::debug_handler]
pub async fn create_candidate(
    State(state): State<AppState>,
    Json(payload): Json<CreateCandidatePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let profile = state.profile_service.create_candidate(payload).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

#[axum::debug_handler]
pub async fn get_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let profile = state.profile_service.get_candidate(id).await?;
    Ok(Json(profile))
}

#[axum::debug_handler]
pub async fn create_interviewer(
    State(state): State<AppState>,
    Json(payload): Json<CreateInterviewerPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let profile = state.profile_service.create_interviewer(payload).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

#[axum::debug_handler]
pub async fn get_interviewer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let profile = state.profile_service.get_interviewer(id).await?;
    Ok(Json(profile))
}
