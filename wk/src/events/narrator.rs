//! Console narrator - the stdout subscriber of the event bus
//!
//! Renders each event as a human-readable line (optionally colored) or as a
//! JSON line. Narration is a plain console stream with no stable format.

use std::io::Write;
use std::sync::Arc;

use colored::Colorize;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::bus::EventBus;
use super::types::{EventLogEntry, WorkshopEvent};
use crate::workshop::Decision;

/// How narration lines are rendered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrationFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for NarrationFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for NarrationFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Stdout subscriber that narrates workshop events
pub struct Narrator {
    format: NarrationFormat,
    color: bool,
}

impl Narrator {
    pub fn new(format: NarrationFormat, color: bool) -> Self {
        debug!(%format, color, "Narrator::new: called");
        Self { format, color }
    }

    /// Render one event; `None` for events not worth a line
    pub fn render(&self, event: &WorkshopEvent) -> Option<String> {
        match self.format {
            NarrationFormat::Json => match serde_json::to_string(&EventLogEntry::new(event.clone())) {
                Ok(line) => Some(line),
                Err(e) => {
                    warn!(event_type = event.event_type(), error = %e, "Narrator: failed to serialize event");
                    None
                }
            },
            NarrationFormat::Text => self.render_text(event),
        }
    }

    fn render_text(&self, event: &WorkshopEvent) -> Option<String> {
        let line = match event {
            WorkshopEvent::CoordinatorSleeping => return None,
            WorkshopEvent::CoordinatorWoke { decision } => match decision {
                Decision::CohortReady => "Coordinator: the whole cohort is back, dispatching.".to_string(),
                Decision::GroupReady => "Coordinator: a group of 3 needs help.".to_string(),
                Decision::SpuriousWake => return None,
            },
            WorkshopEvent::CohortDispatched { released } => {
                format!("Coordinator: released {} cohort members.", released)
            }
            WorkshopEvent::CohortRoundComplete { completions } => {
                format!("Coordinator: {} cohort members finished, back to sleep.", completions)
            }
            WorkshopEvent::GroupDispatched { released } => {
                format!("Coordinator: invited {} group members in.", released)
            }
            WorkshopEvent::GroupAssistDone => "Coordinator: done helping this group, waiting again.".to_string(),
            WorkshopEvent::SpuriousWake {
                cohort_arrivals,
                group_arrivals,
            } => format!(
                "Coordinator: woke with nothing to do (cohort={}, group={}).",
                cohort_arrivals, group_arrivals
            ),
            WorkshopEvent::CohortArrived { worker, count, quorum } => {
                let mut line = format!("Cohort {} returned. Count = {}", worker, count);
                if *quorum {
                    line.push_str(&format!("\nCohort {}: everyone is back, waking the coordinator.", worker));
                }
                line
            }
            WorkshopEvent::CohortDeparted { worker } => format!("Cohort {} dispatched.", worker),
            WorkshopEvent::CohortCompleted { worker } => format!("Cohort {} finished.", worker),
            WorkshopEvent::GroupArrived { worker, count, quorum } => {
                let mut line = format!("Group worker {} needs help. Waiting = {}", worker, count);
                if *quorum {
                    line.push_str(&format!("\nGroup worker {}: group of 3 formed, waking the coordinator.", worker));
                }
                line
            }
            WorkshopEvent::GroupServed { worker } => format!("Group worker {} is being helped.", worker),
            WorkshopEvent::GroupLeft {
                worker,
                remaining,
                gate_released,
            } => {
                if *gate_released {
                    format!("Group worker {} left last; the next group may form.", worker)
                } else {
                    format!("Group worker {} left. Remaining = {}", worker, remaining)
                }
            }
            WorkshopEvent::ActorStopped { .. } => return None,
        };

        if !self.color {
            return Some(line);
        }

        let painted = match event {
            WorkshopEvent::CohortArrived { .. }
            | WorkshopEvent::CohortDeparted { .. }
            | WorkshopEvent::CohortCompleted { .. } => line.as_str().yellow().to_string(),
            WorkshopEvent::GroupArrived { .. } | WorkshopEvent::GroupServed { .. } | WorkshopEvent::GroupLeft { .. } => {
                line.as_str().green().to_string()
            }
            WorkshopEvent::SpuriousWake { .. } => line.as_str().red().to_string(),
            _ => line.as_str().cyan().bold().to_string(),
        };
        Some(painted)
    }

    /// Print events until the bus closes
    pub async fn run(self, mut rx: broadcast::Receiver<WorkshopEvent>) {
        debug!("Narrator::run: starting narrator");
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(line) = self.render(&event) {
                        let mut stdout = std::io::stdout().lock();
                        let _ = writeln!(stdout, "{}", line);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(missed = n, "Narrator: lagged behind, missed events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Narrator: channel closed, shutting down");
                    break;
                }
            }
        }
    }
}

/// Subscribe a narrator to the bus and run it in the background
///
/// The task ends once every emitter and the bus itself are dropped.
pub fn spawn_narrator(event_bus: &Arc<EventBus>, narrator: Narrator) -> JoinHandle<()> {
    let rx = event_bus.subscribe();
    tokio::spawn(narrator.run(rx))
}
