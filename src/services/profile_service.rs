use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::profile_dto::{CreateCandidatePayload, CreateInterviewerPayload};
use crate::error::{Error, Result};
use crate::models::profile::{CandidateProfile, InterviewerProfile};
use crate::utils::normalize::normalize_string_list;

/// Thin facade over the externally-owned profile store. The core only needs
/// lookups for scoring plus seed-style inserts used by tests and local
/// development; real profile management lives elsewhere.
#[derive(Clone)]
pub struct ProfileService {
    pool: PgPool,
}

impl ProfileService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_candidate(&self, id: Uuid) -> Result<CandidateProfile> {
        let profile = sqlx::query_as::<_, CandidateProfile>(
            r#"SELECT * FROM candidate_profiles WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Candidate {} not found", id)))?;
        Ok(profile)
    }

    pub async fn get_interviewer(&self, id: Uuid) -> Result<InterviewerProfile> {
        let profile = sqlx::query_as::<_, InterviewerProfile>(
            r#"SELECT * FROM interviewer_profiles WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Interviewer {} not found", id)))?;
        Ok(profile)
    }

    /// Interviewers that currently offer at least one future slot. The
    /// preview path only cares about these.
    pub async fn list_interviewers_with_future_slots(&self) -> Result<Vec<InterviewerProfile>> {
        let profiles = sqlx::query_as::<_, InterviewerProfile>(
            r#"
            SELECT * FROM interviewer_profiles
            WHERE id IN (SELECT DISTINCT interviewer_id FROM availability_slots WHERE start_at > NOW())
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(profiles)
    }

    pub async fn create_candidate(
        &self,
        payload: CreateCandidatePayload,
    ) -> Result<CandidateProfile> {
        let profile = sqlx::query_as::<_, CandidateProfile>(
            r#"
            INSERT INTO candidate_profiles
                (user_id, display_name, profession, timezone, experience_years, languages, focus_areas)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(payload.user_id)
        .bind(payload.display_name.trim())
        .bind(payload.profession.trim())
        .bind(payload.timezone.trim())
        .bind(payload.experience_years)
        .bind(normalize_string_list(&payload.languages))
        .bind(normalize_string_list(&payload.focus_areas))
        .fetch_one(&self.pool)
        .await?;
        Ok(profile)
    }

    pub async fn create_interviewer(
        &self,
        payload: CreateInterviewerPayload,
    ) -> Result<InterviewerProfile> {
        let profile = sqlx::query_as::<_, InterviewerProfile>(
            r#"
            INSERT INTO interviewer_profiles
                (user_id, display_name, profession, timezone, experience_years, languages, specializations, rating)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(payload.user_id)
        .bind(payload.display_name.trim())
        .bind(payload.profession.trim())
        .bind(payload.timezone.trim())
        .bind(payload.experience_years)
        .bind(normalize_string_list(&payload.languages))
        .bind(normalize_string_list(&payload.specializations))
        .bind(payload.rating)
        .fetch_one(&self.pool)
        .await?;
        Ok(profile)
    }
}
