//! Event types for workshop narration
//!
//! One variant per observable transition of the coordinator, the cohort
//! workers and the group workers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workshop::Decision;

/// Identity of an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ActorId {
    Coordinator,
    Cohort(usize),
    Group(usize),
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coordinator => write!(f, "coordinator"),
            Self::Cohort(id) => write!(f, "cohort-{}", id),
            Self::Group(id) => write!(f, "group-{}", id),
        }
    }
}

/// Core event enum - every transition an actor narrates
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkshopEvent {
    // === Coordinator ===
    /// The coordinator is blocked on its wake signal
    CoordinatorSleeping,
    /// The coordinator woke and evaluated the counters
    CoordinatorWoke { decision: Decision },
    /// Dispatch tokens raised for the whole cohort
    CohortDispatched { released: usize },
    /// Every cohort member acknowledged; the round is closed
    CohortRoundComplete { completions: usize },
    /// Dispatch tokens raised for a group of three
    GroupDispatched { released: usize },
    /// The coordinator finished assisting the current group
    GroupAssistDone,
    /// Woke with neither quorum condition true
    SpuriousWake {
        cohort_arrivals: usize,
        group_arrivals: usize,
    },

    // === Cohort workers ===
    /// A cohort member is back and registered
    CohortArrived { worker: usize, count: usize, quorum: bool },
    /// A cohort member consumed its dispatch token
    CohortDeparted { worker: usize },
    /// A cohort member finished its activity and acknowledged
    CohortCompleted { worker: usize },

    // === Group workers ===
    /// A group worker joined the group being formed
    GroupArrived { worker: usize, count: usize, quorum: bool },
    /// A group member was invited in
    GroupServed { worker: usize },
    /// A group member left
    GroupLeft {
        worker: usize,
        remaining: usize,
        gate_released: bool,
    },

    // === Lifecycle ===
    /// An actor observed cancellation and exited its loop
    ActorStopped { actor: ActorId },
}

impl WorkshopEvent {
    /// Stable name of the variant
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::CoordinatorSleeping => "CoordinatorSleeping",
            Self::CoordinatorWoke { .. } => "CoordinatorWoke",
            Self::CohortDispatched { .. } => "CohortDispatched",
            Self::CohortRoundComplete { .. } => "CohortRoundComplete",
            Self::GroupDispatched { .. } => "GroupDispatched",
            Self::GroupAssistDone => "GroupAssistDone",
            Self::SpuriousWake { .. } => "SpuriousWake",
            Self::CohortArrived { .. } => "CohortArrived",
            Self::CohortDeparted { .. } => "CohortDeparted",
            Self::CohortCompleted { .. } => "CohortCompleted",
            Self::GroupArrived { .. } => "GroupArrived",
            Self::GroupServed { .. } => "GroupServed",
            Self::GroupLeft { .. } => "GroupLeft",
            Self::ActorStopped { .. } => "ActorStopped",
        }
    }

    /// The actor that produced this event
    pub fn actor(&self) -> ActorId {
        match self {
            Self::CoordinatorSleeping
            | Self::CoordinatorWoke { .. }
            | Self::CohortDispatched { .. }
            | Self::CohortRoundComplete { .. }
            | Self::GroupDispatched { .. }
            | Self::GroupAssistDone
            | Self::SpuriousWake { .. } => ActorId::Coordinator,
            Self::CohortArrived { worker, .. } | Self::CohortDeparted { worker } | Self::CohortCompleted { worker } => {
                ActorId::Cohort(*worker)
            }
            Self::GroupArrived { worker, .. } | Self::GroupServed { worker } | Self::GroupLeft { worker, .. } => {
                ActorId::Group(*worker)
            }
            Self::ActorStopped { actor } => *actor,
        }
    }
}

/// Timestamped wrapper used for JSON narration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: WorkshopEvent,
}

impl EventLogEntry {
    pub fn new(event: WorkshopEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}
