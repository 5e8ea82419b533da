//! Coordinator actor
//!
//! `Sleeping → Evaluating → {DispatchingCohort | DispatchingGroup} → Sleeping`

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::cancellable;
use crate::error::Result;
use crate::events::EventEmitter;
use crate::pacing::Pacer;
use crate::workshop::{Decision, Dispatch, Workshop};

/// The single actor that serves the cohort and the groups
pub struct Coordinator {
    workshop: Arc<Workshop>,
    pacer: Arc<dyn Pacer>,
    events: EventEmitter,
    cancel: CancellationToken,
}

impl Coordinator {
    pub fn new(
        workshop: Arc<Workshop>,
        pacer: Arc<dyn Pacer>,
        events: EventEmitter,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            workshop,
            pacer,
            events,
            cancel,
        }
    }

    /// Serve wake-ups until cancelled
    pub async fn run(self) -> Result<()> {
        info!("Coordinator started");
        loop {
            match self.step().await {
                Ok(dispatch) => debug!(?dispatch, "Coordinator::run: step finished"),
                Err(e) if e.is_cancelled() => break,
                Err(e) => return Err(e),
            }
        }
        info!("Coordinator stopped");
        self.events.stopped();
        Ok(())
    }

    /// Sleep for one wake-up and serve whichever population is ready
    ///
    /// Returns only once the coordinator is ready to sleep again: after all
    /// cohort completions, or after assisting a group.
    pub async fn step(&self) -> Result<Dispatch> {
        self.events.coordinator_sleeping();
        self.workshop.await_wake(&self.cancel).await?;

        let dispatch = self.workshop.evaluate_and_dispatch().await;
        self.events.coordinator_woke(dispatch.decision);

        match dispatch.decision {
            Decision::CohortReady => {
                self.events.cohort_dispatched(dispatch.released);
                self.workshop.finish_cohort_round(dispatch.released, &self.cancel).await?;
                self.events.cohort_round_complete(dispatch.released);
            }
            Decision::GroupReady => {
                self.events.group_dispatched(dispatch.released);
                cancellable(&self.cancel, self.pacer.assist()).await?;
                self.workshop.finish_group_service().await;
                self.events.group_assist_done();
            }
            Decision::SpuriousWake => {
                self.events.spurious_wake(dispatch.cohort_arrivals, dispatch.group_arrivals);
            }
        }

        Ok(dispatch)
    }
}
