use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::match_request::MatchRequest;
use crate::models::notification::Notification;
use crate::models::session::SessionSnapshot;
use crate::models::slot::SlotSnapshot;

/// Everything the core publishes for live-subscriber fan-out. Each variant
/// carries a full snapshot of the affected entity, never a diff.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    MatchRequestCreated { request: MatchRequest },
    SlotCreated { snapshot: SlotSnapshot },
    SlotUpdated { snapshot: SlotSnapshot },
    SlotDeleted { slot_id: Uuid },
    SessionCreated { snapshot: SessionSnapshot },
    SessionUpdated { snapshot: SessionSnapshot },
    SessionDeleted { session_id: Uuid },
    SessionHeartbeat { snapshot: SessionSnapshot },
    SessionParticipantJoined { snapshot: SessionSnapshot },
    SessionParticipantLeft { snapshot: SessionSnapshot },
    SessionRestored { snapshot: SessionSnapshot },
    NotificationCreated { notification: Notification },
}

impl AppEvent {
    /// Stable event name used for SSE `event:` framing.
    pub fn name(&self) -> &'static str {
        match self {
            AppEvent::MatchRequestCreated { .. } => "match_request_created",
            AppEvent::SlotCreated { .. } => "slot_created",
            AppEvent::SlotUpdated { .. } => "slot_updated",
            AppEvent::SlotDeleted { .. } => "slot_deleted",
            AppEvent::SessionCreated { .. } => "session_created",
            AppEvent::SessionUpdated { .. } => "session_updated",
            AppEvent::SessionDeleted { .. } => "session_deleted",
            AppEvent::SessionHeartbeat { .. } => "session_heartbeat",
            AppEvent::SessionParticipantJoined { .. } => "session_participant_joined",
            AppEvent::SessionParticipantLeft { .. } => "session_participant_left",
            AppEvent::SessionRestored { .. } => "session_restored",
            AppEvent::NotificationCreated { .. } => "notification_created",
        }
    }
}

/// In-process publish/subscribe fabric decoupling state mutation from
/// fan-out. Fire-and-forget: publishing never blocks on subscribers, and a
/// lagging subscriber drops messages instead of backpressuring producers.
/// Constructed once at startup and injected; tests build their own.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: AppEvent) {
        // A send error only means no subscriber is currently listening.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_without_subscribers_is_a_no_op() {
        let bus = EventBus::new(8);
        bus.publish(AppEvent::SlotDeleted {
            slot_id: Uuid::new_v4(),
        });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let slot_id = Uuid::new_v4();
        bus.publish(AppEvent::SlotDeleted { slot_id });

        match rx.recv().await {
            Ok(AppEvent::SlotDeleted { slot_id: got }) => assert_eq!(got, slot_id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn each_subscriber_gets_its_own_copy() {
        let bus = EventBus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        let slot_id = Uuid::new_v4();
        bus.publish(AppEvent::SlotDeleted { slot_id });

        assert!(matches!(a.recv().await, Ok(AppEvent::SlotDeleted { .. })));
        assert!(matches!(b.recv().await, Ok(AppEvent::SlotDeleted { .. })));
    }
}
