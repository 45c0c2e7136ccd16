use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::match_request::{InterviewMatch, MatchRequest, MatchingScore, SessionFormat};
use crate::models::profile::InterviewerProfile;
use crate::models::slot::AvailabilitySlot;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateMatchRequestPayload {
    pub candidate_id: Uuid,
    #[validate(length(min = 1))]
    pub target_role: String,
    #[serde(default)]
    pub focus_areas: Vec<String>,
    #[serde(default)]
    pub preferred_languages: Vec<String>,
    pub session_format: SessionFormat,
    pub notes: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Request details embedded in a slot join, applied to the candidate's live
/// match request (or used to create one) inside the join transaction.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RequestDetails {
    #[validate(length(min = 1))]
    pub target_role: String,
    #[serde(default)]
    pub focus_areas: Vec<String>,
    #[serde(default)]
    pub preferred_languages: Vec<String>,
    pub session_format: SessionFormat,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequestPayload {
    pub availability_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CompleteMatchPayload {
    #[validate(length(min = 1))]
    pub interviewer_notes: String,
    pub candidate_notes: Option<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i32>,
    pub highlights: Option<String>,
    #[validate(range(min = 0, max = 100))]
    pub effectiveness_score: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewerSummary {
    pub id: Uuid,
    pub display_name: String,
    pub profession: String,
    pub timezone: String,
    pub experience_years: i32,
    pub languages: Vec<String>,
    pub specializations: Vec<String>,
    pub rating: Option<f64>,
}

impl From<InterviewerProfile> for InterviewerSummary {
    fn from(value: InterviewerProfile) -> Self {
        Self {
            id: value.id,
            display_name: value.display_name,
            profession: value.profession,
            timezone: value.timezone,
            experience_years: value.experience_years,
            languages: value.languages,
            specializations: value.specializations,
            rating: value.rating,
        }
    }
}

/// One ranked preview row: an interviewer, the computed score, and that
/// interviewer's future availability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewEntry {
    pub interviewer: InterviewerSummary,
    pub score: MatchingScore,
    pub availability: Vec<AvailabilitySlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub request_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub results: Vec<PreviewEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledMatchResponse {
    pub request: MatchRequest,
    #[serde(rename = "match")]
    pub interview_match: InterviewMatch,
}
