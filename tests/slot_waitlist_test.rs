use std::env;

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use matching_backend::{
    dto::{
        match_dto::RequestDetails,
        profile_dto::{CreateCandidatePayload, CreateInterviewerPayload},
        slot_dto::{CreateAvailabilityPayload, JoinSlotPayload, LeaveSlotPayload},
    },
    error::Error,
    events::EventBus,
    models::{match_request::{MatchRequest, SessionFormat}, slot::SlotRole},
    services::{profile_service::ProfileService, slot_service::SlotService},
};

async fn setup() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    if env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set; skipping slot waitlist tests");
        return None;
    }
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    let _ = matching_backend::config::init_config();

    let pool = matching_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations").run(&pool).await.expect("migrations");
    Some(pool)
}

async fn seed_interviewer(profiles: &ProfileService) -> Uuid {
    profiles
        .create_interviewer(CreateInterviewerPayload {
            user_id: None,
            display_name: "Slot Owner".into(),
            profession: "Platform Engineer".into(),
            timezone: "UTC".into(),
            experience_years: 7,
            languages: vec!["English".into()],
            specializations: vec!["kubernetes".into()],
            rating: Some(4.2),
        })
        .await
        .expect("interviewer")
        .id
}

async fn seed_candidate(profiles: &ProfileService, name: &str) -> Uuid {
    profiles
        .create_candidate(CreateCandidatePayload {
            user_id: None,
            display_name: name.into(),
            profession: "Platform Engineer".into(),
            timezone: "UTC".into(),
            experience_years: 2,
            languages: vec!["English".into()],
            focus_areas: vec!["kubernetes".into()],
        })
        .await
        .expect("candidate")
        .id
}

async fn seed_slot(slots: &SlotService, interviewer_id: Uuid, capacity: i32) -> Uuid {
    let start_at = Utc::now() + Duration::hours(3);
    slots
        .create_availability(CreateAvailabilityPayload {
            interviewer_id,
            start_at,
            end_at: start_at + Duration::hours(1),
            is_recurring: false,
            capacity: Some(capacity),
        })
        .await
        .expect("slot")
        .slot
        .id
}

async fn requests_for(pool: &PgPool, candidate_id: Uuid) -> Vec<MatchRequest> {
    sqlx::query_as::<_, MatchRequest>(
        "SELECT * FROM match_requests WHERE candidate_id = $1 ORDER BY created_at DESC",
    )
    .bind(candidate_id)
    .fetch_all(pool)
    .await
    .expect("requests")
}

fn candidate_join(candidate_id: Uuid) -> JoinSlotPayload {
    JoinSlotPayload {
        role: SlotRole::Candidate,
        candidate_id: Some(candidate_id),
        interviewer_id: None,
        match_request: None,
    }
}

#[tokio::test]
async fn concurrent_joins_never_overfill_a_seat() {
    let Some(pool) = setup().await else { return };
    let events = EventBus::new(64);
    let profiles = ProfileService::new(pool.clone());
    let slots = SlotService::new(pool.clone(), events);

    let interviewer_id = seed_interviewer(&profiles).await;
    let slot_id = seed_slot(&slots, interviewer_id, 1).await;
    let first = seed_candidate(&profiles, "First In").await;
    let second = seed_candidate(&profiles, "Second In").await;

    let (a, b) = tokio::join!(
        slots.join(slot_id, candidate_join(first)),
        slots.join(slot_id, candidate_join(second)),
    );
    let a = a.expect("first join");
    let b = b.expect("second join");

    assert_ne!(a.seated, b.seated, "exactly one join may win the seat");
    let waitlisted = if a.seated { &b } else { &a };
    assert_eq!(waitlisted.participant.waitlist_position, Some(1));

    let snapshot = slots.snapshot(slot_id).await.expect("snapshot");
    assert_eq!(snapshot.seated_count(), 1);
    assert_eq!(snapshot.participants.len(), 2);
}

#[tokio::test]
async fn rejoining_updates_the_live_request_in_place() {
    let Some(pool) = setup().await else { return };
    let events = EventBus::new(64);
    let profiles = ProfileService::new(pool.clone());
    let slots = SlotService::new(pool.clone(), events);

    let interviewer_id = seed_interviewer(&profiles).await;
    let slot_id = seed_slot(&slots, interviewer_id, 2).await;
    let candidate_id = seed_candidate(&profiles, "Returning").await;

    let details = |role: &str| RequestDetails {
        target_role: role.into(),
        focus_areas: vec!["kubernetes".into()],
        preferred_languages: vec![],
        session_format: SessionFormat::Mixed,
        notes: None,
    };

    let mut payload = candidate_join(candidate_id);
    payload.match_request = Some(details("Platform Engineer"));
    let first = slots.join(slot_id, payload).await.expect("first join");
    assert!(first.seated);
    assert!(!first.already_present);

    let requests = requests_for(&pool, candidate_id).await;
    assert_eq!(requests.len(), 1);
    let original_id = requests[0].id;

    let mut payload = candidate_join(candidate_id);
    payload.match_request = Some(details("Staff Platform Engineer"));
    let second = slots.join(slot_id, payload).await.expect("second join");
    assert!(second.already_present);
    assert_eq!(second.participant.id, first.participant.id);

    let requests = requests_for(&pool, candidate_id).await;
    assert_eq!(requests.len(), 1, "rejoin must not duplicate the request");
    assert_eq!(requests[0].id, original_id);
    assert_eq!(requests[0].target_role, "Staff Platform Engineer");
}

#[tokio::test]
async fn leaving_a_seat_promotes_the_waitlist_head() {
    let Some(pool) = setup().await else { return };
    let events = EventBus::new(64);
    let profiles = ProfileService::new(pool.clone());
    let slots = SlotService::new(pool.clone(), events);

    let interviewer_id = seed_interviewer(&profiles).await;
    let slot_id = seed_slot(&slots, interviewer_id, 1).await;
    let seated = seed_candidate(&profiles, "Seated").await;
    let head = seed_candidate(&profiles, "Waitlist Head").await;
    let tail = seed_candidate(&profiles, "Waitlist Tail").await;

    for id in [seated, head, tail] {
        slots.join(slot_id, candidate_join(id)).await.expect("join");
    }

    // The seat is taken, so the slot cannot be deleted yet.
    let err = slots.delete_availability(slot_id).await.unwrap_err();
    assert!(matches!(err, Error::PreconditionFailed(_)));

    let snapshot = slots
        .leave(
            slot_id,
            LeaveSlotPayload {
                candidate_id: Some(seated),
                interviewer_id: None,
            },
        )
        .await
        .expect("leave");

    let promoted = snapshot
        .participants
        .iter()
        .find(|p| p.candidate_id == Some(head))
        .expect("promoted participant");
    assert!(promoted.is_seated());

    let remaining = snapshot
        .participants
        .iter()
        .find(|p| p.candidate_id == Some(tail))
        .expect("remaining participant");
    assert_eq!(remaining.waitlist_position, Some(1));

    for id in [head, tail] {
        slots
            .leave(
                slot_id,
                LeaveSlotPayload {
                    candidate_id: Some(id),
                    interviewer_id: None,
                },
            )
            .await
            .expect("drain slot");
    }
    slots
        .delete_availability(slot_id)
        .await
        .expect("empty slot deletes cleanly");
}
