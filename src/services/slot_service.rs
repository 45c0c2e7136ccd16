use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::dto::slot_dto::{CreateAvailabilityPayload, JoinSlotPayload, LeaveSlotPayload};
use crate::error::{Error, Result};
use crate::events::{AppEvent, EventBus};
use crate::models::slot::{AvailabilitySlot, SlotParticipant, SlotRole, SlotSnapshot};
use crate::services::match_service::MatchService;

/// Outcome of a join attempt inside its transaction.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub participant: SlotParticipant,
    pub seated: bool,
    pub already_present: bool,
}

/// Owns availability slots and their participant lists. Every mutation of a
/// slot's participants runs inside a transaction that locks the slot row, so
/// capacity checks and waitlist positions are computed against committed
/// state and concurrent joins serialize per slot.
#[derive(Clone)]
pub struct SlotService {
    pool: PgPool,
    events: EventBus,
}

impl SlotService {
    pub fn new(pool: PgPool, events: EventBus) -> Self {
        Self { pool, events }
    }

    pub async fn create_availability(
        &self,
        payload: CreateAvailabilityPayload,
    ) -> Result<SlotSnapshot> {
        if payload.end_at <= payload.start_at {
            return Err(Error::BadRequest(
                "Availability must end after it starts".to_string(),
            ));
        }
        let exists = sqlx::query("SELECT id FROM interviewer_profiles WHERE id = $1")
            .bind(payload.interviewer_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(Error::NotFound(format!(
                "Interviewer {} not found",
                payload.interviewer_id
            )));
        }

        let slot = sqlx::query_as::<_, AvailabilitySlot>(
            r#"
            INSERT INTO availability_slots (interviewer_id, start_at, end_at, is_recurring, capacity)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(payload.interviewer_id)
        .bind(payload.start_at)
        .bind(payload.end_at)
        .bind(payload.is_recurring)
        .bind(payload.capacity.unwrap_or(1))
        .fetch_one(&self.pool)
        .await?;

        let snapshot = SlotSnapshot {
            slot,
            participants: Vec::new(),
        };
        self.events.publish(AppEvent::SlotCreated {
            snapshot: snapshot.clone(),
        });
        Ok(snapshot)
    }

    /// Deleting a slot with seated participants is a caller-visible
    /// precondition failure; waitlisted entries alone cascade away.
    pub async fn delete_availability(&self, slot_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let slot = Self::lock_slot(&mut tx, slot_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Availability {} not found", slot_id)))?;
        let participants = Self::participants_in_tx(&mut tx, slot.id).await?;
        let seated = participants.iter().filter(|p| p.is_seated()).count();
        if seated > 0 {
            return Err(Error::PreconditionFailed(format!(
                "Availability {} has {} seated participant(s)",
                slot_id, seated
            )));
        }

        sqlx::query("DELETE FROM availability_slots WHERE id = $1")
            .bind(slot_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        self.events.publish(AppEvent::SlotDeleted { slot_id });
        Ok(())
    }

    pub async fn list_for_interviewer(&self, interviewer_id: Uuid) -> Result<Vec<SlotSnapshot>> {
        let slots = sqlx::query_as::<_, AvailabilitySlot>(
            r#"
            SELECT * FROM availability_slots
            WHERE interviewer_id = $1 AND end_at > NOW()
            ORDER BY start_at ASC
            "#,
        )
        .bind(interviewer_id)
        .fetch_all(&self.pool)
        .await?;

        let mut snapshots = Vec::with_capacity(slots.len());
        for slot in slots {
            let participants = sqlx::query_as::<_, SlotParticipant>(
                r#"
                SELECT * FROM slot_participants
                WHERE slot_id = $1
                ORDER BY waitlist_position ASC NULLS FIRST, joined_at ASC
                "#,
            )
            .bind(slot.id)
            .fetch_all(&self.pool)
            .await?;
            snapshots.push(SlotSnapshot { slot, participants });
        }
        Ok(snapshots)
    }

    /// Atomic join: seats the participant when a seat is free, otherwise
    /// appends to the waitlist. Re-joining with an embedded request payload
    /// updates the candidate's live match request instead of duplicating it.
    pub async fn join(&self, slot_id: Uuid, payload: JoinSlotPayload) -> Result<JoinOutcome> {
        validate_descriptor(&payload)?;

        let mut tx = self.pool.begin().await?;

        let slot = Self::lock_slot(&mut tx, slot_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Availability {} not found", slot_id)))?;

        if let (Some(candidate_id), Some(details)) = (payload.candidate_id, &payload.match_request)
        {
            MatchService::upsert_live_request_in_tx(&mut tx, candidate_id, details).await?;
        }

        let outcome = Self::join_in_tx(
            &mut tx,
            &slot,
            payload.role,
            payload.candidate_id,
            payload.interviewer_id,
        )
        .await?;
        tx.commit().await?;

        self.publish_snapshot(slot_id).await?;
        Ok(outcome)
    }

    /// Removes a participant. When a seated participant leaves and the
    /// waitlist is non-empty, the lowest-positioned waitlisted participant
    /// is promoted into the freed seat and the remaining positions close up.
    pub async fn leave(&self, slot_id: Uuid, payload: LeaveSlotPayload) -> Result<SlotSnapshot> {
        let mut tx = self.pool.begin().await?;

        let slot = Self::lock_slot(&mut tx, slot_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Availability {} not found", slot_id)))?;
        let participants = Self::participants_in_tx(&mut tx, slot.id).await?;

        let leaving = participants
            .iter()
            .find(|p| identifies(p, payload.candidate_id, payload.interviewer_id))
            .cloned()
            .ok_or_else(|| {
                Error::NotFound(format!("Participant not found on slot {}", slot_id))
            })?;

        sqlx::query("DELETE FROM slot_participants WHERE id = $1")
            .bind(leaving.id)
            .execute(&mut *tx)
            .await?;

        let mut waitlisted: Vec<&SlotParticipant> = participants
            .iter()
            .filter(|p| p.id != leaving.id && !p.is_seated())
            .collect();
        waitlisted.sort_by_key(|p| p.waitlist_position);

        if leaving.is_seated() {
            // Promote the head of the waitlist into the freed seat, then
            // re-densify. Updates run lowest position first so the partial
            // unique index never sees a transient collision.
            if let Some((head, rest)) = waitlisted.split_first() {
                sqlx::query(
                    "UPDATE slot_participants SET waitlist_position = NULL WHERE id = $1",
                )
                .bind(head.id)
                .execute(&mut *tx)
                .await?;
                for (i, p) in rest.iter().enumerate() {
                    sqlx::query(
                        "UPDATE slot_participants SET waitlist_position = $1 WHERE id = $2",
                    )
                    .bind((i + 1) as i32)
                    .bind(p.id)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        } else {
            // A waitlisted participant left: close the gap it created.
            for (i, p) in waitlisted.iter().enumerate() {
                let expected = (i + 1) as i32;
                if p.waitlist_position != Some(expected) {
                    sqlx::query(
                        "UPDATE slot_participants SET waitlist_position = $1 WHERE id = $2",
                    )
                    .bind(expected)
                    .bind(p.id)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        tx.commit().await?;
        self.publish_snapshot(slot_id).await
    }

    pub async fn snapshot(&self, slot_id: Uuid) -> Result<SlotSnapshot> {
        let slot = sqlx::query_as::<_, AvailabilitySlot>(
            "SELECT * FROM availability_slots WHERE id = $1",
        )
        .bind(slot_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Availability {} not found", slot_id)))?;

        let participants = sqlx::query_as::<_, SlotParticipant>(
            r#"
            SELECT * FROM slot_participants
            WHERE slot_id = $1
            ORDER BY waitlist_position ASC NULLS FIRST, joined_at ASC
            "#,
        )
        .bind(slot_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(SlotSnapshot { slot, participants })
    }

    pub async fn publish_snapshot(&self, slot_id: Uuid) -> Result<SlotSnapshot> {
        let snapshot = self.snapshot(slot_id).await?;
        self.events.publish(AppEvent::SlotUpdated {
            snapshot: snapshot.clone(),
        });
        Ok(snapshot)
    }

    /// Locks the slot row for the remainder of the transaction, serializing
    /// all participant mutations on this slot.
    pub(crate) async fn lock_slot(
        tx: &mut Transaction<'_, Postgres>,
        slot_id: Uuid,
    ) -> Result<Option<AvailabilitySlot>> {
        let slot = sqlx::query_as::<_, AvailabilitySlot>(
            "SELECT * FROM availability_slots WHERE id = $1 FOR UPDATE",
        )
        .bind(slot_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(slot)
    }

    pub(crate) async fn participants_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        slot_id: Uuid,
    ) -> Result<Vec<SlotParticipant>> {
        let participants = sqlx::query_as::<_, SlotParticipant>(
            r#"
            SELECT * FROM slot_participants
            WHERE slot_id = $1
            ORDER BY waitlist_position ASC NULLS FIRST, joined_at ASC
            "#,
        )
        .bind(slot_id)
        .fetch_all(&mut **tx)
        .await?;
        Ok(participants)
    }

    /// Core seat-or-waitlist step. Assumes the caller already holds the
    /// slot's row lock in this transaction.
    pub(crate) async fn join_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        slot: &AvailabilitySlot,
        role: SlotRole,
        candidate_id: Option<Uuid>,
        interviewer_id: Option<Uuid>,
    ) -> Result<JoinOutcome> {
        let participants = Self::participants_in_tx(tx, slot.id).await?;

        if let Some(existing) = participants
            .iter()
            .find(|p| identifies(p, candidate_id, interviewer_id))
        {
            return Ok(JoinOutcome {
                seated: existing.is_seated(),
                participant: existing.clone(),
                already_present: true,
            });
        }

        let seated_count = participants.iter().filter(|p| p.is_seated()).count() as i32;
        let waitlist_position = if seated_count < slot.capacity {
            None
        } else {
            let max_position = participants
                .iter()
                .filter_map(|p| p.waitlist_position)
                .max()
                .unwrap_or(0);
            Some(max_position + 1)
        };

        let participant = sqlx::query_as::<_, SlotParticipant>(
            r#"
            INSERT INTO slot_participants (slot_id, role, candidate_id, interviewer_id, waitlist_position)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(slot.id)
        .bind(role)
        .bind(candidate_id)
        .bind(interviewer_id)
        .bind(waitlist_position)
        .fetch_one(&mut **tx)
        .await?;

        Ok(JoinOutcome {
            seated: participant.is_seated(),
            participant,
            already_present: false,
        })
    }
}

fn identifies(
    participant: &SlotParticipant,
    candidate_id: Option<Uuid>,
    interviewer_id: Option<Uuid>,
) -> bool {
    match (candidate_id, interviewer_id) {
        (Some(cid), _) if participant.candidate_id == Some(cid) => true,
        (_, Some(iid)) if participant.interviewer_id == Some(iid) => true,
        _ => false,
    }
}

fn validate_descriptor(payload: &JoinSlotPayload) -> Result<()> {
    let ok = match payload.role {
        SlotRole::Candidate => payload.candidate_id.is_some(),
        SlotRole::Interviewer => payload.interviewer_id.is_some(),
        SlotRole::Observer => payload.candidate_id.is_some() || payload.interviewer_id.is_some(),
    };
    if ok {
        Ok(())
    } else {
        Err(Error::BadRequest(
            "Join descriptor must carry an id matching its role".to_string(),
        ))
    }
}
