use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::dto::session_dto::{
    CreateSessionPayload, HeartbeatPayload, JoinSessionPayload, LeaveSessionPayload,
    SessionListQuery, UpdateSessionStatusPayload,
};
use crate::error::{Error, Result};
use crate::events::{AppEvent, EventBus};
use crate::models::session::{
    RealtimeSession, SessionParticipant, SessionRole, SessionSnapshot, SessionStatus,
    HEARTBEAT_GRACE_SECS,
};

/// Liveness model for in-progress interview calls: participants,
/// heartbeats, and status transitions. Independent of the matching
/// lifecycle; driven entirely by explicit calls from session participants.
#[derive(Clone)]
pub struct SessionService {
    pool: PgPool,
    events: EventBus,
}

impl SessionService {
    pub fn new(pool: PgPool, events: EventBus) -> Self {
        Self { pool, events }
    }

    pub async fn create(&self, payload: CreateSessionPayload) -> Result<SessionSnapshot> {
        let mut tx = self.pool.begin().await?;

        let session = sqlx::query_as::<_, RealtimeSession>(
            r#"
            INSERT INTO realtime_sessions (match_id, host_id, title, metadata)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(payload.match_id)
        .bind(payload.host_id)
        .bind(&payload.title)
        .bind(&payload.metadata)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO session_participants (session_id, user_id, role, connection_id)
            VALUES ($1, $2, 'host', $3)
            "#,
        )
        .bind(session.id)
        .bind(payload.host_id)
        .bind(&payload.connection_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let snapshot = self.snapshot(session.id).await?;
        self.events.publish(AppEvent::SessionCreated {
            snapshot: snapshot.clone(),
        });
        Ok(snapshot)
    }

    /// Adds a participant, promoting the session to active on first join.
    /// A departed participant who joins again is restored in place.
    pub async fn join(&self, session_id: Uuid, payload: JoinSessionPayload) -> Result<SessionSnapshot> {
        let mut tx = self.pool.begin().await?;
        let session = Self::lock_session(&mut tx, session_id).await?;

        if session.status.is_terminal() {
            return Err(Error::PreconditionFailed(format!(
                "Session {} is {:?} and cannot be joined",
                session_id, session.status
            )));
        }

        let existing = sqlx::query_as::<_, SessionParticipant>(
            "SELECT * FROM session_participants WHERE session_id = $1 AND user_id = $2",
        )
        .bind(session_id)
        .bind(payload.user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let restored = match existing {
            Some(participant) => {
                sqlx::query(
                    r#"
                    UPDATE session_participants
                    SET left_at = NULL, last_seen_at = NOW(), connection_id = COALESCE($1, connection_id)
                    WHERE id = $2
                    "#,
                )
                .bind(&payload.connection_id)
                .bind(participant.id)
                .execute(&mut *tx)
                .await?;
                participant.left_at.is_some()
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO session_participants (session_id, user_id, role, connection_id)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(session_id)
                .bind(payload.user_id)
                .bind(payload.role.unwrap_or(SessionRole::Observer))
                .bind(&payload.connection_id)
                .execute(&mut *tx)
                .await?;
                false
            }
        };

        if session.status == SessionStatus::Scheduled {
            sqlx::query(
                "UPDATE realtime_sessions SET status = 'active', updated_at = NOW() WHERE id = $1",
            )
            .bind(session_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let snapshot = self.snapshot(session_id).await?;
        let event = if restored {
            AppEvent::SessionRestored {
                snapshot: snapshot.clone(),
            }
        } else {
            AppEvent::SessionParticipantJoined {
                snapshot: snapshot.clone(),
            }
        };
        self.events.publish(event);
        Ok(snapshot)
    }

    /// Marks the participant as departed. The row stays, so rejoin and
    /// reporting keep the full attendance history.
    pub async fn leave(&self, session_id: Uuid, payload: LeaveSessionPayload) -> Result<SessionSnapshot> {
        let mut tx = self.pool.begin().await?;
        Self::lock_session(&mut tx, session_id).await?;

        let updated = sqlx::query(
            r#"
            UPDATE session_participants
            SET left_at = NOW(), last_seen_at = NOW()
            WHERE session_id = $1 AND user_id = $2
            "#,
        )
        .bind(session_id)
        .bind(payload.user_id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "Participant {} not found in session {}",
                payload.user_id, session_id
            )));
        }

        tx.commit().await?;

        let snapshot = self.snapshot(session_id).await?;
        self.events.publish(AppEvent::SessionParticipantLeft {
            snapshot: snapshot.clone(),
        });
        Ok(snapshot)
    }

    /// Refreshes the session's liveness. Promotes scheduled sessions to
    /// active; when a participant is named, also refreshes their
    /// `last_seen_at` and clears a previous departure.
    pub async fn heartbeat(&self, session_id: Uuid, payload: HeartbeatPayload) -> Result<SessionSnapshot> {
        let mut tx = self.pool.begin().await?;
        let session = Self::lock_session(&mut tx, session_id).await?;

        if session.status.is_terminal() {
            return Err(Error::PreconditionFailed(format!(
                "Session {} is {:?} and no longer accepts heartbeats",
                session_id, session.status
            )));
        }

        sqlx::query(
            r#"
            UPDATE realtime_sessions
            SET last_heartbeat = NOW(),
                status = CASE WHEN status = 'scheduled' THEN 'active'::session_status ELSE status END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .execute(&mut *tx)
        .await?;

        let mut restored = false;
        if let Some(user_id) = payload.user_id {
            let participant = sqlx::query_as::<_, SessionParticipant>(
                "SELECT * FROM session_participants WHERE session_id = $1 AND user_id = $2",
            )
            .bind(session_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
            if let Some(participant) = participant {
                restored = participant.left_at.is_some();
                sqlx::query(
                    "UPDATE session_participants SET last_seen_at = NOW(), left_at = NULL WHERE id = $1",
                )
                .bind(participant.id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        let snapshot = self.snapshot(session_id).await?;
        if restored {
            self.events.publish(AppEvent::SessionRestored {
                snapshot: snapshot.clone(),
            });
        }
        self.events.publish(AppEvent::SessionHeartbeat {
            snapshot: snapshot.clone(),
        });
        Ok(snapshot)
    }

    /// Explicit status transition with exhaustive checking. Ending a
    /// session stamps `ended_at` (unless supplied) and clears the
    /// heartbeat; terminal states reject everything further.
    pub async fn update_status(
        &self,
        session_id: Uuid,
        payload: UpdateSessionStatusPayload,
    ) -> Result<SessionSnapshot> {
        let mut tx = self.pool.begin().await?;
        let session = Self::lock_session(&mut tx, session_id).await?;

        let allowed = match (session.status, payload.status) {
            // Self-transitions are idempotent only while the session is
            // live; terminal states reject everything, including themselves.
            (current, next) if current == next => !current.is_terminal(),
            (SessionStatus::Scheduled, SessionStatus::Active)
            | (SessionStatus::Scheduled, SessionStatus::Ended)
            | (SessionStatus::Scheduled, SessionStatus::Cancelled)
            | (SessionStatus::Active, SessionStatus::Ended)
            | (SessionStatus::Active, SessionStatus::Cancelled) => true,
            (SessionStatus::Active, SessionStatus::Scheduled) => false,
            (SessionStatus::Ended, _) | (SessionStatus::Cancelled, _) => false,
            (SessionStatus::Scheduled, SessionStatus::Scheduled)
            | (SessionStatus::Active, SessionStatus::Active) => true,
        };
        if !allowed {
            return Err(Error::PreconditionFailed(format!(
                "Session {} cannot transition {:?} -> {:?}",
                session_id, session.status, payload.status
            )));
        }

        match payload.status {
            SessionStatus::Ended => {
                sqlx::query(
                    r#"
                    UPDATE realtime_sessions
                    SET status = 'ended', ended_at = COALESCE($1, ended_at, NOW()),
                        last_heartbeat = NULL, updated_at = NOW()
                    WHERE id = $2
                    "#,
                )
                .bind(payload.ended_at)
                .bind(session_id)
                .execute(&mut *tx)
                .await?;
            }
            status => {
                sqlx::query(
                    "UPDATE realtime_sessions SET status = $1, updated_at = NOW() WHERE id = $2",
                )
                .bind(status)
                .bind(session_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        let snapshot = self.snapshot(session_id).await?;
        self.events.publish(AppEvent::SessionUpdated {
            snapshot: snapshot.clone(),
        });
        Ok(snapshot)
    }

    /// Hard removal, used for cleanup. Participant rows cascade away.
    pub async fn delete(&self, session_id: Uuid) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM realtime_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Session {} not found", session_id)));
        }
        self.events.publish(AppEvent::SessionDeleted { session_id });
        Ok(())
    }

    pub async fn snapshot(&self, session_id: Uuid) -> Result<SessionSnapshot> {
        let session =
            sqlx::query_as::<_, RealtimeSession>("SELECT * FROM realtime_sessions WHERE id = $1")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Session {} not found", session_id)))?;

        let participants = sqlx::query_as::<_, SessionParticipant>(
            "SELECT * FROM session_participants WHERE session_id = $1 ORDER BY joined_at ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(SessionSnapshot {
            session,
            participants,
        })
    }

    pub async fn list(&self, query: SessionListQuery) -> Result<Vec<RealtimeSession>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM realtime_sessions WHERE 1=1");

        if let Some(status) = query.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(host_id) = query.host_id {
            builder.push(" AND host_id = ").push_bind(host_id);
        }
        if let Some(match_id) = query.match_id {
            builder.push(" AND match_id = ").push_bind(match_id);
        }
        if query.active_only.unwrap_or(false) {
            builder
                .push(" AND (status = 'active' OR last_heartbeat > NOW() - make_interval(secs => ")
                .push_bind(HEARTBEAT_GRACE_SECS as f64)
                .push("))");
        }
        builder
            .push(" ORDER BY started_at DESC LIMIT ")
            .push_bind(query.limit.unwrap_or(50).clamp(1, 200));

        let sessions = builder
            .build_query_as::<RealtimeSession>()
            .fetch_all(&self.pool)
            .await?;
        Ok(sessions)
    }

    async fn lock_session(
        tx: &mut Transaction<'_, Postgres>,
        session_id: Uuid,
    ) -> Result<RealtimeSession> {
        let session = sqlx::query_as::<_, RealtimeSession>(
            "SELECT * FROM realtime_sessions WHERE id = $1 FOR UPDATE",
        )
        .bind(session_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Session {} not found", session_id)))?;
        Ok(session)
    }
}
