use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::events::{AppEvent, EventBus};
use crate::models::match_request::RequestStatus;
use crate::services::match_service::MatchService;

/// One schedulable option for a queued request: a concrete slot plus the
/// score of the interviewer offering it.
#[derive(Debug, Clone)]
pub struct SlotChoice {
    pub slot_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub percentage: i32,
    pub meets_threshold: bool,
}

/// Orders the schedulable options for a request. Past slots are discarded;
/// options meeting the score threshold are preferred, falling back to the
/// full set when none do; ties break by earlier start, then slot id, so the
/// result is deterministic for identical inputs.
pub fn rank_choices(mut choices: Vec<SlotChoice>, now: DateTime<Utc>) -> Vec<SlotChoice> {
    choices.retain(|c| c.start_at > now);
    if choices.iter().any(|c| c.meets_threshold) {
        choices.retain(|c| c.meets_threshold);
    }
    choices.sort_by(|a, b| {
        b.percentage
            .cmp(&a.percentage)
            .then_with(|| a.start_at.cmp(&b.start_at))
            .then_with(|| a.slot_id.cmp(&b.slot_id))
    });
    choices
}

/// Background coordinator that turns queued requests into scheduled
/// matches. Fed by the `MatchRequestCreated` event and by a periodic poll
/// over persisted queued requests (which recovers from restarts and missed
/// events); both feeds land in a de-duplicating pending set drained by a
/// single-flight loop.
pub struct AutomationService {
    events: EventBus,
    matches: MatchService,
    pending: Mutex<HashSet<Uuid>>,
    draining: AtomicBool,
    poll_interval: Duration,
    batch_size: i64,
}

impl AutomationService {
    pub fn new(
        events: EventBus,
        matches: MatchService,
        poll_interval: Duration,
        batch_size: i64,
    ) -> Self {
        Self {
            events,
            matches,
            pending: Mutex::new(HashSet::new()),
            draining: AtomicBool::new(false),
            poll_interval,
            batch_size,
        }
    }

    pub fn enqueue(&self, request_id: Uuid) {
        self.pending
            .lock()
            .expect("automation pending set poisoned")
            .insert(request_id);
    }

    pub fn pending_count(&self) -> usize {
        self.pending
            .lock()
            .expect("automation pending set poisoned")
            .len()
    }

    /// Worker loop. Exits promptly when the token is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut events = self.events.subscribe();
        let mut tick = tokio::time::interval(self.poll_interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(
            poll_secs = self.poll_interval.as_secs(),
            batch = self.batch_size,
            "Automation worker started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Automation worker shutting down");
                    break;
                }
                _ = tick.tick() => {
                    if let Err(e) = self.poll_queued().await {
                        tracing::error!(error = ?e, "Automation poll failed");
                    }
                    self.drain().await;
                }
                event = events.recv() => {
                    match event {
                        Ok(AppEvent::MatchRequestCreated { request }) => {
                            self.enqueue(request.id);
                            self.drain().await;
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(missed)) => {
                            // The poll feed re-discovers anything we missed.
                            tracing::warn!(missed, "Automation event feed lagged");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        }
    }

    /// Re-scans persisted queued requests, oldest first, into the pending
    /// set. Recovers requests whose creation event was missed or predates
    /// this process.
    pub async fn poll_queued(&self) -> Result<()> {
        if let Err(e) = self.matches.expire_overdue().await {
            tracing::error!(error = ?e, "Expiry sweep failed");
        }
        let queued = self.matches.list_queued(self.batch_size).await?;
        for request in queued {
            self.enqueue(request.id);
        }
        Ok(())
    }

    /// Single-flight drain of the pending set. A concurrent call while a
    /// drain is running is a no-op; ids enqueued mid-drain are picked up by
    /// the next sweep of the loop. One request's failure is logged and never
    /// blocks the rest.
    pub async fn drain(&self) {
        if self.draining.swap(true, Ordering::SeqCst) {
            return;
        }

        loop {
            let batch: Vec<Uuid> = {
                let mut pending = self
                    .pending
                    .lock()
                    .expect("automation pending set poisoned");
                pending.drain().collect()
            };
            if batch.is_empty() {
                break;
            }
            for request_id in batch {
                if let Err(e) = self.process_request(request_id).await {
                    tracing::error!(error = ?e, request_id = %request_id, "Automation processing failed");
                }
            }
        }

        self.draining.store(false, Ordering::SeqCst);
    }

    /// Tries to schedule one queued request onto its best viable slot. A
    /// request with no viable slot stays queued; losing a race for a slot
    /// falls through to the next candidate.
    async fn process_request(&self, request_id: Uuid) -> Result<()> {
        let request = match self.matches.get_request(request_id).await {
            Ok(request) => request,
            Err(Error::NotFound(_)) => return Ok(()),
            Err(e) => return Err(e),
        };
        if request.status != RequestStatus::Queued {
            return Ok(());
        }

        let preview = self.matches.preview(request_id).await?;
        let choices: Vec<SlotChoice> = preview
            .results
            .iter()
            .flat_map(|entry| {
                entry.availability.iter().map(|slot| SlotChoice {
                    slot_id: slot.id,
                    start_at: slot.start_at,
                    percentage: entry.score.percentage,
                    meets_threshold: entry.score.meets_threshold,
                })
            })
            .collect();

        for choice in rank_choices(choices, Utc::now()) {
            match self.matches.schedule(request_id, choice.slot_id).await {
                Ok(scheduled) => {
                    tracing::info!(
                        request_id = %request_id,
                        slot_id = %choice.slot_id,
                        score = choice.percentage,
                        match_id = %scheduled.interview_match.id,
                        "Automation scheduled request"
                    );
                    return Ok(());
                }
                // Race lost or slot became invalid: try the next option.
                Err(Error::PreconditionFailed(reason)) => {
                    tracing::debug!(request_id = %request_id, slot_id = %choice.slot_id, %reason, "Slot rejected, trying next");
                }
                Err(Error::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        tracing::debug!(request_id = %request_id, "No viable slot, leaving request queued");
        Ok(())
    }
}
