//! Event Bus - pub/sub for workshop narration
//!
//! Actors emit onto a tokio broadcast channel. With no subscribers the events
//! are dropped, which is how tests run silent.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use super::types::{ActorId, WorkshopEvent};
use crate::workshop::Decision;

/// Default channel capacity (events)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10_000;

/// Central event bus for workshop activity
pub struct EventBus {
    tx: broadcast::Sender<WorkshopEvent>,
}

impl EventBus {
    /// Create a new event bus with the given capacity
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "EventBus::new: creating event bus");
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Create a new event bus with default capacity
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Emit an event to all subscribers
    pub fn emit(&self, event: WorkshopEvent) {
        debug!(event_type = event.event_type(), "EventBus::emit");
        // No subscribers is fine
        let _ = self.tx.send(event);
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<WorkshopEvent> {
        debug!("EventBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    /// Create an emitter bound to one actor
    pub fn emitter_for(&self, actor: ActorId) -> EventEmitter {
        debug!(%actor, "EventBus::emitter_for: creating emitter");
        EventEmitter {
            tx: self.tx.clone(),
            actor,
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Create a shared event bus with default capacity
pub fn create_event_bus() -> Arc<EventBus> {
    Arc::new(EventBus::with_default_capacity())
}

/// Per-actor handle for emitting events without owning the bus
#[derive(Clone)]
pub struct EventEmitter {
    tx: broadcast::Sender<WorkshopEvent>,
    actor: ActorId,
}

impl EventEmitter {
    /// Emit a raw event
    pub fn emit(&self, event: WorkshopEvent) {
        debug!(actor = %self.actor, event_type = event.event_type(), "EventEmitter::emit");
        let _ = self.tx.send(event);
    }

    /// Worker number for worker-bound emitters
    fn worker(&self) -> usize {
        match self.actor {
            ActorId::Cohort(id) | ActorId::Group(id) => id,
            ActorId::Coordinator => 0,
        }
    }

    // === Coordinator ===

    pub fn coordinator_sleeping(&self) {
        self.emit(WorkshopEvent::CoordinatorSleeping);
    }

    pub fn coordinator_woke(&self, decision: Decision) {
        self.emit(WorkshopEvent::CoordinatorWoke { decision });
    }

    pub fn cohort_dispatched(&self, released: usize) {
        self.emit(WorkshopEvent::CohortDispatched { released });
    }

    pub fn cohort_round_complete(&self, completions: usize) {
        self.emit(WorkshopEvent::CohortRoundComplete { completions });
    }

    pub fn group_dispatched(&self, released: usize) {
        self.emit(WorkshopEvent::GroupDispatched { released });
    }

    pub fn group_assist_done(&self) {
        self.emit(WorkshopEvent::GroupAssistDone);
    }

    pub fn spurious_wake(&self, cohort_arrivals: usize, group_arrivals: usize) {
        self.emit(WorkshopEvent::SpuriousWake {
            cohort_arrivals,
            group_arrivals,
        });
    }

    // === Cohort workers ===

    pub fn cohort_arrived(&self, count: usize, quorum: bool) {
        self.emit(WorkshopEvent::CohortArrived {
            worker: self.worker(),
            count,
            quorum,
        });
    }

    pub fn cohort_departed(&self) {
        self.emit(WorkshopEvent::CohortDeparted { worker: self.worker() });
    }

    pub fn cohort_completed(&self) {
        self.emit(WorkshopEvent::CohortCompleted { worker: self.worker() });
    }

    // === Group workers ===

    pub fn group_arrived(&self, count: usize, quorum: bool) {
        self.emit(WorkshopEvent::GroupArrived {
            worker: self.worker(),
            count,
            quorum,
        });
    }

    pub fn group_served(&self) {
        self.emit(WorkshopEvent::GroupServed { worker: self.worker() });
    }

    pub fn group_left(&self, remaining: usize, gate_released: bool) {
        self.emit(WorkshopEvent::GroupLeft {
            worker: self.worker(),
            remaining,
            gate_released,
        });
    }

    // === Lifecycle ===

    pub fn stopped(&self) {
        self.emit(WorkshopEvent::ActorStopped { actor: self.actor });
    }
}
