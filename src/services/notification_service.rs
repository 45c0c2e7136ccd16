use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::events::{AppEvent, EventBus};
use crate::models::notification::Notification;

/// Creates and lists in-app notification rows, publishing each new one to
/// the event bus so live subscribers see it immediately. Outbound channel
/// delivery (email, push, telegram) is handled by an external module.
#[derive(Clone)]
pub struct NotificationService {
    pool: PgPool,
    events: EventBus,
}

impl NotificationService {
    pub fn new(pool: PgPool, events: EventBus) -> Self {
        Self { pool, events }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        kind: &str,
        title: &str,
        body: &str,
        payload: JsonValue,
    ) -> Result<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, kind, title, body, payload)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(title)
        .bind(body)
        .bind(payload)
        .fetch_one(&self.pool)
        .await?;

        self.events.publish(AppEvent::NotificationCreated {
            notification: notification.clone(),
        });
        Ok(notification)
    }

    pub async fn list_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit.clamp(1, 200))
        .fetch_all(&self.pool)
        .await?;
        Ok(notifications)
    }

    pub async fn mark_read(&self, id: Uuid) -> Result<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications SET read_at = COALESCE(read_at, NOW())
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(notification)
    }
}
