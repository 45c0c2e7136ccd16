use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::Result, AppState};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct NotificationQuery {
    pub limit: Option<i64>,
}

#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<NotificationQuery>,
) -> Result<impl IntoResponse> {
    let notifications = state
        .notification_service
        .list_for_user(user_id, query.limit.unwrap_or(50))
        .await?;
    Ok(Json(notifications))
}

#[axum::debug_handler]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let notification = state.notification_service.mark_read(id).await?;
    Ok(Json(notification))
}
