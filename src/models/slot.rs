use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "slot_role", rename_all = "snake_case")]
pub enum SlotRole {
    Candidate,
    Interviewer,
    Observer,
}

/// A bounded time window an interviewer offers, with finite seat capacity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AvailabilitySlot {
    pub id: Uuid,
    pub interviewer_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub is_recurring: bool,
    pub capacity: i32,
    pub created_at: DateTime<Utc>,
}

/// A seated or waitlisted occupant of a slot. `waitlist_position` is NULL
/// for seated participants; waitlisted positions start at 1 and stay dense.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SlotParticipant {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub role: SlotRole,
    pub candidate_id: Option<Uuid>,
    pub interviewer_id: Option<Uuid>,
    pub waitlist_position: Option<i32>,
    pub joined_at: DateTime<Utc>,
}

impl SlotParticipant {
    pub fn is_seated(&self) -> bool {
        self.waitlist_position.is_none()
    }
}

/// Full state of a slot as published to live subscribers: the slot plus its
/// seated and waitlisted participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub slot: AvailabilitySlot,
    pub participants: Vec<SlotParticipant>,
}

impl SlotSnapshot {
    pub fn seated_count(&self) -> usize {
        self.participants.iter().filter(|p| p.is_seated()).count()
    }
}
