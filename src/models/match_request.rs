use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "session_format", rename_all = "snake_case")]
pub enum SessionFormat {
    SystemDesign,
    Coding,
    Behavioral,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
pub enum RequestStatus {
    Queued,
    Matched,
    Scheduled,
    Completed,
    Cancelled,
    Expired,
}

impl RequestStatus {
    /// Terminal states reject every further transition.
    pub fn is_terminal(self) -> bool {
        match self {
            RequestStatus::Completed | RequestStatus::Cancelled | RequestStatus::Expired => true,
            RequestStatus::Queued | RequestStatus::Matched | RequestStatus::Scheduled => false,
        }
    }
}

/// A candidate's outstanding ask to be paired with an interviewer. At most
/// one non-terminal request per candidate exists at a time; writers upsert
/// into the live row instead of inserting duplicates.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchRequest {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub target_role: String,
    pub focus_areas: Vec<String>,
    pub preferred_languages: Vec<String>,
    pub session_format: SessionFormat,
    pub notes: Option<String>,
    pub status: RequestStatus,
    pub matched_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Scheduling outcome attached to a request. Created exactly once by the
/// schedule operation; completion mutates it in place.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewMatch {
    pub id: Uuid,
    pub request_id: Uuid,
    pub interviewer_id: Uuid,
    pub slot_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
    pub room_url: Option<String>,
    pub room_id: Option<String>,
    pub effectiveness_score: Option<i32>,
    pub completed_at: Option<DateTime<Utc>>,
    pub summary: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ephemeral compatibility score, recomputed on demand. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingScore {
    pub percentage: i32,
    pub meets_threshold: bool,
}
