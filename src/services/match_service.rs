use chrono::Utc;
use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::config::get_config;
use crate::dto::match_dto::{
    CompleteMatchPayload, CreateMatchRequestPayload, PreviewEntry, PreviewResponse,
    RequestDetails, ScheduledMatchResponse,
};
use crate::error::{Error, Result};
use crate::events::{AppEvent, EventBus};
use crate::models::match_request::{InterviewMatch, MatchRequest, RequestStatus};
use crate::models::slot::{AvailabilitySlot, SlotRole};
use crate::services::hook_service::HookService;
use crate::services::profile_service::ProfileService;
use crate::services::scoring::score_pairing;
use crate::services::slot_service::SlotService;
use crate::utils::normalize::normalize_string_list;

/// Owns the match-request state machine: queued requests, previews against
/// interviewer availability, the atomic schedule transaction, completion,
/// and terminal transitions.
#[derive(Clone)]
pub struct MatchService {
    pool: PgPool,
    events: EventBus,
    profiles: ProfileService,
    slots: SlotService,
    hooks: HookService,
}

impl MatchService {
    pub fn new(
        pool: PgPool,
        events: EventBus,
        profiles: ProfileService,
        slots: SlotService,
        hooks: HookService,
    ) -> Self {
        Self {
            pool,
            events,
            profiles,
            slots,
            hooks,
        }
    }

    /// Creates (or refreshes) the candidate's live request. A candidate has
    /// at most one non-terminal request at a time, so a second create
    /// updates the existing row instead of inserting a duplicate.
    pub async fn create_request(
        &self,
        payload: CreateMatchRequestPayload,
    ) -> Result<MatchRequest> {
        self.profiles.get_candidate(payload.candidate_id).await?;

        let details = RequestDetails {
            target_role: payload.target_role,
            focus_areas: payload.focus_areas,
            preferred_languages: payload.preferred_languages,
            session_format: payload.session_format,
            notes: payload.notes,
        };

        let mut tx = self.pool.begin().await?;
        let mut request =
            Self::upsert_live_request_in_tx(&mut tx, payload.candidate_id, &details).await?;
        if payload.expires_at.is_some() {
            request = sqlx::query_as::<_, MatchRequest>(
                "UPDATE match_requests SET expires_at = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
            )
            .bind(payload.expires_at)
            .bind(request.id)
            .fetch_one(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        self.events.publish(AppEvent::MatchRequestCreated {
            request: request.clone(),
        });
        Ok(request)
    }

    /// Upserts the candidate's live request inside an existing transaction.
    /// Shared with the slot-join path, which may carry embedded request
    /// details. The live row is locked so concurrent writers cannot create
    /// a duplicate.
    pub(crate) async fn upsert_live_request_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        candidate_id: Uuid,
        details: &RequestDetails,
    ) -> Result<MatchRequest> {
        let focus_areas = normalize_string_list(&details.focus_areas);
        let preferred_languages = normalize_string_list(&details.preferred_languages);
        let target_role = details.target_role.trim().to_string();
        if target_role.is_empty() {
            return Err(Error::BadRequest("Target role must not be empty".to_string()));
        }

        // FOR UPDATE cannot lock a row that does not exist yet, so two
        // concurrent first-time creates would both insert. The advisory lock
        // serializes writers per candidate for the rest of the transaction;
        // the partial unique index on live requests backstops it.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1::text))")
            .bind(candidate_id)
            .execute(&mut **tx)
            .await?;

        let live = sqlx::query_as::<_, MatchRequest>(
            r#"
            SELECT * FROM match_requests
            WHERE candidate_id = $1 AND status IN ('queued', 'matched', 'scheduled')
            ORDER BY created_at DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(candidate_id)
        .fetch_optional(&mut **tx)
        .await?;

        let request = match live {
            Some(existing) => {
                sqlx::query_as::<_, MatchRequest>(
                    r#"
                    UPDATE match_requests
                    SET target_role = $1, focus_areas = $2, preferred_languages = $3,
                        session_format = $4, notes = $5, updated_at = NOW()
                    WHERE id = $6
                    RETURNING *
                    "#,
                )
                .bind(&target_role)
                .bind(&focus_areas)
                .bind(&preferred_languages)
                .bind(details.session_format)
                .bind(&details.notes)
                .bind(existing.id)
                .fetch_one(&mut **tx)
                .await?
            }
            None => {
                sqlx::query_as::<_, MatchRequest>(
                    r#"
                    INSERT INTO match_requests
                        (candidate_id, target_role, focus_areas, preferred_languages, session_format, notes, status)
                    VALUES ($1, $2, $3, $4, $5, $6, 'queued')
                    RETURNING *
                    "#,
                )
                .bind(candidate_id)
                .bind(&target_role)
                .bind(&focus_areas)
                .bind(&preferred_languages)
                .bind(details.session_format)
                .bind(&details.notes)
                .fetch_one(&mut **tx)
                .await?
            }
        };
        Ok(request)
    }

    pub async fn get_request(&self, id: Uuid) -> Result<MatchRequest> {
        let request =
            sqlx::query_as::<_, MatchRequest>("SELECT * FROM match_requests WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Match request {} not found", id)))?;
        Ok(request)
    }

    pub async fn get_match(&self, id: Uuid) -> Result<InterviewMatch> {
        let m = sqlx::query_as::<_, InterviewMatch>("SELECT * FROM interview_matches WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Interview match {} not found", id)))?;
        Ok(m)
    }

    /// Read-only ranking of every interviewer with future availability
    /// against the stored request preferences. Safe to call repeatedly and
    /// concurrently; mutates nothing.
    pub async fn preview(&self, request_id: Uuid) -> Result<PreviewResponse> {
        let request = self.get_request(request_id).await?;
        let candidate = self.profiles.get_candidate(request.candidate_id).await?;
        let interviewers = self.profiles.list_interviewers_with_future_slots().await?;

        let slots = sqlx::query_as::<_, AvailabilitySlot>(
            r#"
            SELECT * FROM availability_slots
            WHERE start_at > NOW()
            ORDER BY start_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut results: Vec<PreviewEntry> = interviewers
            .into_iter()
            .map(|interviewer| {
                let score = score_pairing(&request, &candidate, &interviewer);
                let availability: Vec<AvailabilitySlot> = slots
                    .iter()
                    .filter(|s| s.interviewer_id == interviewer.id)
                    .cloned()
                    .collect();
                PreviewEntry {
                    interviewer: interviewer.into(),
                    score,
                    availability,
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .percentage
                .cmp(&a.score.percentage)
                .then_with(|| {
                    b.interviewer
                        .rating
                        .unwrap_or(0.0)
                        .total_cmp(&a.interviewer.rating.unwrap_or(0.0))
                })
                .then_with(|| a.interviewer.id.cmp(&b.interviewer.id))
        });

        Ok(PreviewResponse {
            request_id,
            generated_at: Utc::now(),
            results,
        })
    }

    /// Atomically seats the candidate on the chosen slot, marks the request
    /// scheduled, and creates the interview match. Everything happens in one
    /// transaction; any failure rolls the whole operation back. Callers must
    /// treat precondition failures as "try another slot", not fatal errors.
    pub async fn schedule(
        &self,
        request_id: Uuid,
        availability_id: Uuid,
    ) -> Result<ScheduledMatchResponse> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, MatchRequest>(
            "SELECT * FROM match_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Match request {} not found", request_id)))?;

        if request.status != RequestStatus::Queued {
            return Err(Error::PreconditionFailed(format!(
                "Match request {} is not queued",
                request_id
            )));
        }

        let slot = SlotService::lock_slot(&mut tx, availability_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("Availability {} not found", availability_id))
            })?;
        if slot.start_at <= Utc::now() {
            return Err(Error::PreconditionFailed(format!(
                "Availability {} already started",
                availability_id
            )));
        }

        let outcome = SlotService::join_in_tx(
            &mut tx,
            &slot,
            SlotRole::Candidate,
            Some(request.candidate_id),
            None,
        )
        .await?;
        if !outcome.seated {
            // Waitlisting is not scheduling; roll everything back and let
            // the caller pick another slot.
            return Err(Error::PreconditionFailed(format!(
                "Availability {} has no free seat",
                availability_id
            )));
        }

        let (room_id, room_url) = match &get_config().room_base_url {
            Some(base) => {
                let room_id = Uuid::new_v4().to_string();
                let room_url = format!("{}/{}", base.trim_end_matches('/'), room_id);
                (Some(room_id), Some(room_url))
            }
            None => (None, None),
        };

        let interview_match = sqlx::query_as::<_, InterviewMatch>(
            r#"
            INSERT INTO interview_matches (request_id, interviewer_id, slot_id, scheduled_at, room_url, room_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(request.id)
        .bind(slot.interviewer_id)
        .bind(slot.id)
        .bind(slot.start_at)
        .bind(room_url)
        .bind(room_id)
        .fetch_one(&mut *tx)
        .await?;

        let request = sqlx::query_as::<_, MatchRequest>(
            r#"
            UPDATE match_requests
            SET status = 'scheduled', matched_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(request.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        // The schedule is durable from here on. Fan-out and hooks are
        // best-effort: a failed lookup is logged, never surfaced to the
        // caller of an operation that already committed.
        if let Err(e) = self
            .announce_scheduled(&request, &interview_match, &slot)
            .await
        {
            tracing::warn!(error = ?e, request_id = %request.id, "Post-schedule effects failed");
        }

        Ok(ScheduledMatchResponse {
            request,
            interview_match,
        })
    }

    async fn announce_scheduled(
        &self,
        request: &MatchRequest,
        interview_match: &InterviewMatch,
        slot: &AvailabilitySlot,
    ) -> Result<()> {
        let snapshot = self.slots.publish_snapshot(slot.id).await?;
        let candidate = self.profiles.get_candidate(request.candidate_id).await?;
        let interviewer = self.profiles.get_interviewer(slot.interviewer_id).await?;
        self.hooks
            .on_match_scheduled(request, interview_match, &candidate, &interviewer, &snapshot.slot)
            .await;
        Ok(())
    }

    /// Attaches the summary and effectiveness score, transitioning the
    /// request to completed. A second call overwrites the previous summary.
    pub async fn complete(
        &self,
        match_id: Uuid,
        payload: CompleteMatchPayload,
    ) -> Result<ScheduledMatchResponse> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, InterviewMatch>(
            "SELECT * FROM interview_matches WHERE id = $1 FOR UPDATE",
        )
        .bind(match_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Interview match {} not found", match_id)))?;

        let request = sqlx::query_as::<_, MatchRequest>(
            "SELECT * FROM match_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(existing.request_id)
        .fetch_one(&mut *tx)
        .await?;

        match request.status {
            RequestStatus::Matched | RequestStatus::Scheduled | RequestStatus::Completed => {}
            other => {
                return Err(Error::PreconditionFailed(format!(
                    "Match request {} cannot be completed from status {:?}",
                    request.id, other
                )));
            }
        }

        let summary = json!({
            "interviewer_notes": payload.interviewer_notes,
            "candidate_notes": payload.candidate_notes,
            "strengths": payload.strengths,
            "improvements": payload.improvements,
            "rating": payload.rating,
            "highlights": payload.highlights,
        });

        let interview_match = sqlx::query_as::<_, InterviewMatch>(
            r#"
            UPDATE interview_matches
            SET summary = $1, effectiveness_score = $2, completed_at = NOW(), updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(summary)
        .bind(payload.effectiveness_score.clamp(0, 100))
        .bind(match_id)
        .fetch_one(&mut *tx)
        .await?;

        let request = sqlx::query_as::<_, MatchRequest>(
            "UPDATE match_requests SET status = 'completed', updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(request.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ScheduledMatchResponse {
            request,
            interview_match,
        })
    }

    pub async fn cancel(&self, request_id: Uuid) -> Result<MatchRequest> {
        self.transition_terminal(request_id, RequestStatus::Cancelled)
            .await
    }

    pub async fn expire(&self, request_id: Uuid) -> Result<MatchRequest> {
        self.transition_terminal(request_id, RequestStatus::Expired)
            .await
    }

    async fn transition_terminal(
        &self,
        request_id: Uuid,
        target: RequestStatus,
    ) -> Result<MatchRequest> {
        let mut tx = self.pool.begin().await?;
        let request = sqlx::query_as::<_, MatchRequest>(
            "SELECT * FROM match_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Match request {} not found", request_id)))?;

        if request.status.is_terminal() {
            return Err(Error::PreconditionFailed(format!(
                "Match request {} is already terminal ({:?})",
                request_id, request.status
            )));
        }

        let request = sqlx::query_as::<_, MatchRequest>(
            "UPDATE match_requests SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(target)
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(request)
    }

    /// Sweeps queued requests whose deadline passed. Returns the number of
    /// requests expired; invoked by the automation tick.
    pub async fn expire_overdue(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE match_requests
            SET status = 'expired', updated_at = NOW()
            WHERE status = 'queued' AND expires_at IS NOT NULL AND expires_at <= NOW()
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_queued(&self, limit: i64) -> Result<Vec<MatchRequest>> {
        let requests = sqlx::query_as::<_, MatchRequest>(
            r#"
            SELECT * FROM match_requests
            WHERE status = 'queued'
            ORDER BY created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    pub async fn list_recent_completed(
        &self,
        interviewer_id: Uuid,
        limit: i64,
    ) -> Result<Vec<InterviewMatch>> {
        let matches = sqlx::query_as::<_, InterviewMatch>(
            r#"
            SELECT * FROM interview_matches
            WHERE interviewer_id = $1 AND completed_at IS NOT NULL
            ORDER BY completed_at DESC
            LIMIT $2
            "#,
        )
        .bind(interviewer_id)
        .bind(limit.clamp(1, 100))
        .fetch_all(&self.pool)
        .await?;
        Ok(matches)
    }
}
