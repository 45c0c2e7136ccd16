use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::match_dto::RequestDetails;
use crate::models::slot::{SlotParticipant, SlotRole, SlotSnapshot};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAvailabilityPayload {
    pub interviewer_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    #[serde(default)]
    pub is_recurring: bool,
    #[validate(range(min = 1, max = 4))]
    pub capacity: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct JoinSlotPayload {
    pub role: SlotRole,
    pub candidate_id: Option<Uuid>,
    pub interviewer_id: Option<Uuid>,
    #[validate(nested)]
    pub match_request: Option<RequestDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveSlotPayload {
    pub candidate_id: Option<Uuid>,
    pub interviewer_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinSlotResponse {
    pub participant: SlotParticipant,
    pub seated: bool,
    pub already_joined: bool,
    pub snapshot: SlotSnapshot,
}
