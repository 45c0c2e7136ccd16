use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::models::session::{SessionRole, SessionStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionPayload {
    pub host_id: Uuid,
    pub match_id: Option<Uuid>,
    pub title: Option<String>,
    pub metadata: Option<JsonValue>,
    pub connection_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinSessionPayload {
    pub user_id: Uuid,
    pub role: Option<SessionRole>,
    pub connection_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveSessionPayload {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatPayload {
    /// When set, also refreshes this participant's `last_seen_at`.
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSessionStatusPayload {
    pub status: SessionStatus,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SessionListQuery {
    pub status: Option<SessionStatus>,
    pub host_id: Option<Uuid>,
    pub match_id: Option<Uuid>,
    pub active_only: Option<bool>,
    pub limit: Option<i64>,
}
