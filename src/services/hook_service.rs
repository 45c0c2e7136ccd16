use reqwest::Client;
use serde_json::json;

use crate::models::match_request::{InterviewMatch, MatchRequest};
use crate::models::profile::{CandidateProfile, InterviewerProfile};
use crate::models::slot::AvailabilitySlot;
use crate::services::notification_service::NotificationService;

const WEBHOOK_TIMEOUT_SECS: u64 = 10;

/// Side-effect dispatcher fired once per successful schedule: in-app
/// notifications for both parties and an optional outbound webhook. The
/// three effects run independently; a failure in any of them is logged and
/// never fails (or rolls back) the scheduling transaction that already
/// committed.
#[derive(Clone)]
pub struct HookService {
    notifications: NotificationService,
    client: Client,
    webhook_url: Option<String>,
}

impl HookService {
    pub fn new(notifications: NotificationService, webhook_url: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(WEBHOOK_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            notifications,
            client,
            webhook_url,
        }
    }

    pub async fn on_match_scheduled(
        &self,
        request: &MatchRequest,
        interview_match: &InterviewMatch,
        candidate: &CandidateProfile,
        interviewer: &InterviewerProfile,
        slot: &AvailabilitySlot,
    ) {
        let when = slot.start_at.to_rfc3339();
        let payload = json!({
            "request_id": request.id,
            "match_id": interview_match.id,
            "scheduled_at": interview_match.scheduled_at,
            "room_url": interview_match.room_url,
            "slot_id": slot.id,
        });

        if let Some(user_id) = candidate.user_id {
            let body = format!(
                "Your {} interview with {} is scheduled for {}",
                request.target_role, interviewer.display_name, when
            );
            if let Err(e) = self
                .notifications
                .create(user_id, "match_scheduled", "Interview scheduled", &body, payload.clone())
                .await
            {
                tracing::warn!(error = ?e, request_id = %request.id, "Failed to notify candidate");
            }
        }

        if let Some(user_id) = interviewer.user_id {
            let body = format!(
                "You are scheduled to interview {} ({}) on {}",
                candidate.display_name, request.target_role, when
            );
            if let Err(e) = self
                .notifications
                .create(user_id, "match_scheduled", "Interview scheduled", &body, payload.clone())
                .await
            {
                tracing::warn!(error = ?e, request_id = %request.id, "Failed to notify interviewer");
            }
        }

        if let Some(url) = &self.webhook_url {
            let body = json!({
                "event": "match_scheduled",
                "request_id": request.id,
                "match_id": interview_match.id,
                "candidate": { "id": candidate.id, "display_name": candidate.display_name },
                "interviewer": { "id": interviewer.id, "display_name": interviewer.display_name },
                "window": { "start_at": slot.start_at, "end_at": slot.end_at },
                "scheduled_at": interview_match.scheduled_at,
            });
            match self.client.post(url).json(&body).send().await {
                Ok(resp) if !resp.status().is_success() => {
                    tracing::warn!(status = %resp.status(), request_id = %request.id, "Schedule webhook rejected");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = ?e, request_id = %request.id, "Schedule webhook delivery failed");
                }
            }
        }
    }
}
