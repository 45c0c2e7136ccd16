use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// In-app notification row. Delivery over external channels (email, push)
/// belongs to the notification module outside this service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub payload: JsonValue,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
