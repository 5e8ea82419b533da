//! Group worker actor

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::cancellable;
use crate::error::Result;
use crate::events::EventEmitter;
use crate::pacing::Pacer;
use crate::workshop::Workshop;

/// A worker that periodically needs help, served three at a time
pub struct GroupWorker {
    id: usize,
    workshop: Arc<Workshop>,
    pacer: Arc<dyn Pacer>,
    events: EventEmitter,
    cancel: CancellationToken,
}

impl GroupWorker {
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

    /// Repeat work/help cycles until cancelled
    pub async fn run(self) -> Result<()> {
        debug!(worker = self.id, "GroupWorker::run: started");
        loop {
            match self.step().await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => break,
                Err(e) => return Err(e),
            }
        }
        info!(worker = self.id, "Group worker stopped");
        self.events.stopped();
        Ok(())
    }

    /// One cycle: work, join a group, wait for the invite, get helped, leave
    pub async fn step(&self) -> Result<()> {
        cancellable(&self.cancel, self.pacer.work(self.id)).await?;

        self.workshop.enter_group_gate(&self.cancel).await?;
        let arrival = self.workshop.group_arrive().await;
        self.events.group_arrived(arrival.count, arrival.quorum);

        self.workshop.await_group_dispatch(&self.cancel).await?;
        self.events.group_served();

        cancellable(&self.cancel, self.pacer.receive_assistance(self.id)).await?;

        let departure = self.workshop.group_depart().await;
        self.events.group_left(departure.remaining, departure.group_finished);
        Ok(())
    }
}
