// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Event Bus Implementation - Pub/Sub for Domain Events
//
// In-memory event streaming over tokio broadcast channels. Publishing with
// no subscribers is not an error; slow subscribers lose the oldest events.

use archetype_cortex::{CortexEvent, FragmentId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::events::IntegrationEvent;

/// Unified domain event type for the event bus
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    Cortex(CortexEvent),
    Integration(IntegrationEvent),
}

impl DomainEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::Cortex(event) => event.event_type(),
            DomainEvent::Integration(event) => event.event_type(),
        }
    }
}

/// Event bus for publishing and subscribing to domain events
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<DomainEvent>>,
}

impl EventBus {
    /// Capacity is how many events are buffered before the oldest are dropped
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create event bus with default capacity (1000)
    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    pub fn publish_cortex_event(&self, event: CortexEvent) {
        self.publish(DomainEvent::Cortex(event));
    }

    pub fn publish_integration_event(&self, event: IntegrationEvent) {
        self.publish(DomainEvent::Integration(event));
    }

    fn publish(&self, event: DomainEvent) {
        debug!(event_type = event.event_type(), "Publishing event");

        // send() only fails when nobody is subscribed
        if self.sender.send(event).is_err() {
            debug!("No subscribers listening to event");
        }
    }

    /// Subscribe to all domain events
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Subscribe to cortex events concerning a single fragment
    pub fn subscribe_fragment(&self, fragment_id: FragmentId) -> FragmentEventReceiver {
        FragmentEventReceiver {
            receiver: self.sender.subscribe(),
            fragment_id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

fn map_recv_error(e: broadcast::error::RecvError) -> EventBusError {
    match e {
        broadcast::error::RecvError::Closed => EventBusError::Closed,
        broadcast::error::RecvError::Lagged(n) => {
            warn!("Event receiver lagged by {} events", n);
            EventBusError::Lagged(n)
        }
    }
}

/// Receiver for all domain events
pub struct EventReceiver {
    receiver: broadcast::Receiver<DomainEvent>,
}

impl EventReceiver {
    pub async fn recv(&mut self) -> Result<DomainEvent, EventBusError> {
        self.receiver.recv().await.map_err(map_recv_error)
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<DomainEvent, EventBusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => EventBusError::Empty,
            broadcast::error::TryRecvError::Closed => EventBusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }
}

/// Receiver filtered to one fragment's cortex events
pub struct FragmentEventReceiver {
    receiver: broadcast::Receiver<DomainEvent>,
    fragment_id: FragmentId,
}

impl FragmentEventReceiver {
    pub async fn recv(&mut self) -> Result<CortexEvent, EventBusError> {
        loop {
            let event = self.receiver.recv().await.map_err(map_recv_error)?;
            if let DomainEvent::Cortex(cortex_event) = event {
                if cortex_event.fragment_id() == Some(self.fragment_id) {
                    return Ok(cortex_event);
                }
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn recorded(fragment_id: FragmentId) -> CortexEvent {
        CortexEvent::AnalysisRecorded {
            fragment_id,
            matches: 1,
            novel_patterns: 0,
            confidence: 0.5,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        event_bus.publish_cortex_event(recorded(FragmentId::new()));

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event_type(), "analysis_recorded");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let event_bus = EventBus::new(4);
        assert_eq!(event_bus.subscriber_count(), 0);
        event_bus.publish_integration_event(IntegrationEvent::IntegratedAnalysisCompleted {
            analysis_id: Uuid::new_v4(),
            confidence: 0.3,
            correlations: 0,
            fallbacks: 0,
            timestamp: Utc::now(),
        });
    }

    #[tokio::test]
    async fn test_fragment_event_filtering() {
        let event_bus = EventBus::new(10);
        let wanted = FragmentId::new();
        let mut receiver = event_bus.subscribe_fragment(wanted);

        event_bus.publish_cortex_event(recorded(FragmentId::new()));
        event_bus.publish_cortex_event(CortexEvent::HistoryTrimmed {
            removed: 1,
            retained: 3,
            timestamp: Utc::now(),
        });
        event_bus.publish_cortex_event(recorded(wanted));

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.fragment_id(), Some(wanted));
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let event_bus = EventBus::new(10);
        let mut first = event_bus.subscribe();
        let mut second = event_bus.subscribe();
        assert_eq!(event_bus.subscriber_count(), 2);

        event_bus.publish_cortex_event(recorded(FragmentId::new()));

        assert!(first.recv().await.is_ok());
        assert!(second.recv().await.is_ok());
        assert!(matches!(first.try_recv(), Err(EventBusError::Empty)));
    }
}
