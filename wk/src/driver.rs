//! Runtime that spawns and stops the workshop actors

use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::actors::{CohortWorker, Coordinator, GroupWorker};
use crate::config::Config;
use crate::error::Result;
use crate::events::{ActorId, EventBus};
use crate::pacing::{Pacer, RandomPacer};
use crate::workshop::{Workshop, WorkshopSnapshot};

/// One coordinator, the cohort and the group workers, running as tokio tasks
pub struct WorkshopRuntime {
    workshop: Arc<Workshop>,
    cancel: CancellationToken,
    tasks: Vec<(ActorId, JoinHandle<Result<()>>)>,
}

impl WorkshopRuntime {
    /// Spawn every actor against a fresh workshop
    ///
    /// Cohort workers are numbered `1..=cohort_size`, group workers
    /// `1..=group_workers`.
    pub fn spawn(cohort_size: usize, group_workers: usize, pacer: Arc<dyn Pacer>, bus: Arc<EventBus>) -> Self {
        debug!(cohort_size, group_workers, "WorkshopRuntime::spawn: called");
        let workshop = Arc::new(Workshop::new(cohort_size));
        let cancel = CancellationToken::new();
        let mut tasks = Vec::with_capacity(1 + cohort_size + group_workers);

        let coordinator = Coordinator::new(
            workshop.clone(),
            pacer.clone(),
            bus.emitter_for(ActorId::Coordinator),
            cancel.child_token(),
        );
        tasks.push((ActorId::Coordinator, tokio::spawn(coordinator.run())));

        for id in 1..=cohort_size {
            let actor = ActorId::Cohort(id);
            let worker = CohortWorker::new(
                id,
                workshop.clone(),
                pacer.clone(),
                bus.emitter_for(actor),
                cancel.child_token(),
            );
            tasks.push((actor, tokio::spawn(worker.run())));
        }

        for id in 1..=group_workers {
            let actor = ActorId::Group(id);
            let worker = GroupWorker::new(
                id,
                workshop.clone(),
                pacer.clone(),
                bus.emitter_for(actor),
                cancel.child_token(),
            );
            tasks.push((actor, tokio::spawn(worker.run())));
        }

        info!(actors = tasks.len(), "Workshop running");
        Self {
            workshop,
            cancel,
            tasks,
        }
    }

    /// Spawn with populations and randomized timing from `config`
    pub fn from_config(config: &Config, bus: Arc<EventBus>) -> Self {
        let pacer: Arc<dyn Pacer> = Arc::new(RandomPacer::new(config.timing.clone()));
        Self::spawn(config.cohort_size, config.group_workers, pacer, bus)
    }

    /// Token whose cancellation stops every actor
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn actor_count(&self) -> usize {
        self.tasks.len()
    }

    /// Cancel every actor, wait for all of them, and return the final snapshot
    ///
    /// The first actor failure is returned after all tasks have been joined.
    pub async fn shutdown(self) -> Result<WorkshopSnapshot> {
        debug!("WorkshopRuntime::shutdown: called");
        self.cancel.cancel();

        let (actors, handles): (Vec<_>, Vec<_>) = self.tasks.into_iter().unzip();
        let results = join_all(handles).await;

        let mut first_error = None;
        for (actor, result) in actors.into_iter().zip(results) {
            let outcome = match result {
                Ok(inner) => inner,
                Err(join_err) => Err(join_err.into()),
            };
            if let Err(e) = outcome {
                error!(%actor, error = %e, "Actor ended with an error");
                first_error.get_or_insert(e);
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        let snapshot = self.workshop.snapshot().await;
        info!(
            cohort_rounds = snapshot.stats.cohort_rounds,
            groups_served = snapshot.stats.groups_served,
            "Workshop stopped"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::create_event_bus;
    use crate::pacing::InstantPacer;
    use std::time::Duration;

    #[tokio::test]
    async fn test_spawn_counts_every_actor() {
        let runtime = WorkshopRuntime::spawn(4, 5, Arc::new(InstantPacer), create_event_bus());
        assert_eq!(runtime.actor_count(), 1 + 4 + 5);
        runtime.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_returns_snapshot_with_progress() {
        let runtime = WorkshopRuntime::spawn(3, 6, Arc::new(InstantPacer), create_event_bus());
        tokio::time::sleep(Duration::from_millis(100)).await;

        let snapshot = runtime.shutdown().await.unwrap();
        assert_eq!(snapshot.cohort_size, 3);
        assert!(snapshot.stats.coordinator_wakes > 0);
        assert_eq!(snapshot.stats.spurious_wakes, 0);
    }

    #[tokio::test]
    async fn test_shutdown_emits_stopped_for_every_actor() {
        let bus = create_event_bus();
        let mut rx = bus.subscribe();
        let runtime = WorkshopRuntime::spawn(2, 3, Arc::new(InstantPacer), bus.clone());
        runtime.shutdown().await.unwrap();

        let mut stopped = 0;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, crate::events::WorkshopEvent::ActorStopped { .. }) {
                stopped += 1;
            }
        }
        assert_eq!(stopped, 1 + 2 + 3);
    }
}
