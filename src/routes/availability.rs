use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::slot_dto::{CreateAvailabilityPayload, JoinSlotPayload, JoinSlotResponse, LeaveSlotPayload},
    error::Result,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/availability",
    request_body = CreateAvailabilityPayload,
    responses(
        (status = 201, description = "Availability slot created"),
        (status = 400, description = "Invalid window or capacity"),
        (status = 404, description = "Interviewer not found")
    )
)]
#[axum::debug_handler]
pub async fn create_availability(
    State(state): State<AppState>,
    Json(payload): Json<CreateAvailabilityPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let snapshot = state.slot_service.create_availability(payload).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

#[utoipa::path(
    delete,
    path = "/api/availability/{id}",
    params(("id" = Uuid, Path, description = "Availability slot ID")),
    responses(
        (status = 204, description = "Availability deleted"),
        (status = 404, description = "Availability not found"),
        (status = 409, description = "Slot still has seated participants")
    )
)]
#[axum::debug_handler]
pub async fn delete_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.slot_service.delete_availability(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn list_interviewer_availability(
    State(state): State<AppState>,
    Path(interviewer_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let snapshots = state.slot_service.list_for_interviewer(interviewer_id).await?;
    Ok(Json(snapshots))
}

#[utoipa::path(
    post,
    path = "/api/availability/{id}/join",
    params(("id" = Uuid, Path, description = "Availability slot ID")),
    request_body = JoinSlotPayload,
    responses(
        (status = 200, description = "Seated or waitlisted on the slot"),
        (status = 400, description = "Descriptor does not match its role"),
        (status = 404, description = "Availability not found")
    )
)]
#[axum::debug_handler]
pub async fn join_slot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<JoinSlotPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let outcome = state.slot_service.join(id, payload).await?;
    let snapshot = state.slot_service.snapshot(id).await?;
    Ok(Json(JoinSlotResponse {
        seated: outcome.seated,
        already_joined: outcome.already_present,
        participant: outcome.participant,
        snapshot,
    }))
}

#[axum::debug_handler]
pub async fn leave_slot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LeaveSlotPayload>,
) -> Result<impl IntoResponse> {
    let snapshot = state.slot_service.leave(id, payload).await?;
    Ok(Json(snapshot))
}
