pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod events;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::events::EventBus;
use crate::services::{
    hook_service::HookService, match_service::MatchService,
    notification_service::NotificationService, profile_service::ProfileService,
    session_service::SessionService, slot_service::SlotService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub events: EventBus,
    pub profile_service: ProfileService,
    pub notification_service: NotificationService,
    pub slot_service: SlotService,
    pub match_service: MatchService,
    pub session_service: SessionService,
}

impl AppState {
    pub fn new(pool: PgPool, events: EventBus) -> Self {
        let config = crate::config::get_config();

        let profile_service = ProfileService::new(pool.clone());
        let notification_service = NotificationService::new(pool.clone(), events.clone());
        let hook_service = HookService::new(
            notification_service.clone(),
            config.match_webhook_url.clone(),
        );
        let slot_service = SlotService::new(pool.clone(), events.clone());
        let match_service = MatchService::new(
            pool.clone(),
            events.clone(),
            profile_service.clone(),
            slot_service.clone(),
            hook_service,
        );
        let session_service = SessionService::new(pool.clone(), events.clone());

        Self {
            pool,
            events,
            profile_service,
            notification_service,
            slot_service,
            match_service,
            session_service,
        }
    }
}
