use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Candidate identity and preferences as stored by the external profile
/// service. Read-only input to scoring; the core never mutates these rows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateProfile {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub display_name: String,
    pub profession: String,
    pub timezone: String,
    pub experience_years: i32,
    pub languages: Vec<String>,
    pub focus_areas: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewerProfile {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub display_name: String,
    pub profession: String,
    pub timezone: String,
    pub experience_years: i32,
    pub languages: Vec<String>,
    pub specializations: Vec<String>,
    pub rating: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
