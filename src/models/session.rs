use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// Grace window during which a session still counts as live after its most
/// recent heartbeat, absorbing brief network gaps without flapping `status`.
pub const HEARTBEAT_GRACE_SECS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "session_status", rename_all = "snake_case")]
pub enum SessionStatus {
    Scheduled,
    Active,
    Ended,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        match self {
            SessionStatus::Ended | SessionStatus::Cancelled => true,
            SessionStatus::Scheduled | SessionStatus::Active => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "session_role", rename_all = "snake_case")]
pub enum SessionRole {
    Host,
    Interviewer,
    Candidate,
    Observer,
}

/// Liveness record for an in-progress interview call, tracked independently
/// of the match that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RealtimeSession {
    pub id: Uuid,
    pub match_id: Option<Uuid>,
    pub host_id: Uuid,
    pub title: Option<String>,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub metadata: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RealtimeSession {
    /// Live for reporting purposes: explicitly active, or heartbeating
    /// within the grace window.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        if self.status == SessionStatus::Active {
            return true;
        }
        self.last_heartbeat
            .map(|hb| now - hb <= Duration::seconds(HEARTBEAT_GRACE_SECS))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionParticipant {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub role: SessionRole,
    pub joined_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
    pub connection_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session: RealtimeSession,
    pub participants: Vec<SessionParticipant>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(status: SessionStatus, last_heartbeat: Option<DateTime<Utc>>) -> RealtimeSession {
        let now = Utc::now();
        RealtimeSession {
            id: Uuid::new_v4(),
            match_id: None,
            host_id: Uuid::new_v4(),
            title: None,
            status,
            started_at: now,
            ended_at: None,
            last_heartbeat,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn active_session_is_live_without_heartbeat() {
        let s = session(SessionStatus::Active, None);
        assert!(s.is_live(Utc::now()));
    }

    #[test]
    fn scheduled_session_is_live_within_grace_window() {
        let now = Utc::now();
        let s = session(SessionStatus::Scheduled, Some(now - Duration::seconds(10)));
        assert!(s.is_live(now));
    }

    #[test]
    fn scheduled_session_is_not_live_past_grace_window() {
        let now = Utc::now();
        let s = session(SessionStatus::Scheduled, Some(now - Duration::seconds(45)));
        assert!(!s.is_live(now));
    }

    #[test]
    fn terminal_states_reject_transitions() {
        assert!(SessionStatus::Ended.is_terminal());
        assert!(SessionStatus::Cancelled.is_terminal());
        assert!(!SessionStatus::Active.is_terminal());
    }
}
