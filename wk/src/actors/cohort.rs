//! Cohort worker actor

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::cancellable;
use crate::error::Result;
use crate::events::EventEmitter;
use crate::pacing::Pacer;
use crate::workshop::Workshop;

/// One member of the full cohort
pub struct CohortWorker {
    id: usize,
    workshop: Arc<Workshop>,
    pacer: Arc<dyn Pacer>,
    events: EventEmitter,
    cancel: CancellationToken,
}

impl CohortWorker {
    pub fn new(
        id: usize,
        workshop: Arc<Workshop>,
        pacer: Arc<dyn Pacer>,
        events: EventEmitter,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            workshop,
            pacer,
            events,
            cancel,
        }
    }

    /// Repeat rounds until cancelled
    pub async fn run(self) -> Result<()> {
        debug!(worker = self.id, "CohortWorker::run: started");
        loop {
            match self.step().await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => break,
                Err(e) => return Err(e),
            }
        }
        info!(worker = self.id, "Cohort worker stopped");
        self.events.stopped();
        Ok(())
    }

    /// One round: away, arrive, wait for dispatch, deliver, acknowledge,
    /// wait for the round to close
    pub async fn step(&self) -> Result<()> {
        cancellable(&self.cancel, self.pacer.away(self.id)).await?;

        let arrival = self.workshop.cohort_arrive().await;
        self.events.cohort_arrived(arrival.count, arrival.quorum);

        self.workshop.await_cohort_dispatch(&self.cancel).await?;
        self.events.cohort_departed();

        cancellable(&self.cancel, self.pacer.deliver(self.id)).await?;

        self.workshop.cohort_complete();
        self.events.cohort_completed();

        self.workshop.await_cohort_release(&self.cancel).await
    }
}
