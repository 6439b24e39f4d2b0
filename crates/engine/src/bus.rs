//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`TicketEvent`]s. Ticket
//! mutation endpoints publish events; the [`crate::AutomationDispatcher`]
//! subscribes and matches them against automation rules. It is designed to
//! be shared via `Arc<EventBus>` across the application.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use flowdesk_core::types::{DbId, Timestamp};
use flowdesk_core::TriggerEvent;

// ---------------------------------------------------------------------------
// TicketEvent
// ---------------------------------------------------------------------------

/// A ticket-domain event.
///
/// Constructed via [`TicketEvent::new`] and enriched with the builder
/// methods [`with_stage`](TicketEvent::with_stage),
/// [`with_field`](TicketEvent::with_field), and
/// [`with_actor`](TicketEvent::with_actor).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketEvent {
    /// What happened.
    pub kind: TriggerEvent,

    /// The ticket the event concerns.
    pub ticket_id: DbId,

    /// The process the ticket belongs to.
    pub process_id: DbId,

    /// Target stage for stage-change events.
    pub stage_id: Option<DbId>,

    /// Updated field for field-update events.
    pub field_id: Option<String>,

    /// The user that caused the event, if any.
    pub actor_user_id: Option<DbId>,

    /// When the event was created (UTC).
    pub occurred_at: Timestamp,
}

impl TicketEvent {
    /// Create a new event with the required identifiers.
    pub fn new(kind: TriggerEvent, ticket_id: DbId, process_id: DbId) -> Self {
        Self {
            kind,
            ticket_id,
            process_id,
            stage_id: None,
            field_id: None,
            actor_user_id: None,
            occurred_at: Utc::now(),
        }
    }

    /// Attach the target stage to the event.
    pub fn with_stage(mut self, stage_id: DbId) -> Self {
        self.stage_id = Some(stage_id);
        self
    }

    /// Attach the updated field to the event.
    pub fn with_field(mut self, field_id: impl Into<String>) -> Self {
        self.field_id = Some(field_id.into());
        self
    }

    /// Attach the acting user to the event.
    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so any number of subscribers can
/// independently receive every published [`TicketEvent`].
pub struct EventBus {
    sender: broadcast::Sender<TicketEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: TicketEvent) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Create a new subscription receiving all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<TicketEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            TicketEvent::new(TriggerEvent::TicketCreated, 1, 2)
                .with_actor(7),
        );

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, TriggerEvent::TicketCreated);
        assert_eq!(event.ticket_id, 1);
        assert_eq!(event.process_id, 2);
        assert_eq!(event.actor_user_id, Some(7));
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let bus = EventBus::default();
        bus.publish(TicketEvent::new(TriggerEvent::Overdue, 1, 2));
    }

    #[test]
    fn builders_set_optional_fields() {
        let event = TicketEvent::new(TriggerEvent::StageChanged, 1, 2)
            .with_stage(5)
            .with_field("priority");
        assert_eq!(event.stage_id, Some(5));
        assert_eq!(event.field_id.as_deref(), Some("priority"));
    }
}
