//! Shared coordination object
//!
//! `Workshop` owns the counters, the lock guarding them, and every signal the
//! actors hand off through. Actors never touch the counters directly; each
//! step of their state machines is one method here.

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::Result;
use crate::sync::{Gate, Signal};

use super::tally::{
    CohortArrival, CoordinatorPhase, Decision, GroupArrival, GroupDeparture, Tally, WorkshopStats,
};

/// What the coordinator did after waking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    pub decision: Decision,
    /// Dispatch tokens raised (0 for a spurious wake)
    pub released: usize,
    /// Counter values seen during evaluation
    pub cohort_arrivals: usize,
    pub group_arrivals: usize,
}

/// Raise/consume totals for one signal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalCounts {
    pub raised: u64,
    pub consumed: u64,
    pub outstanding: usize,
}

impl SignalCounts {
    fn of(signal: &Signal) -> Self {
        Self {
            raised: signal.raised(),
            consumed: signal.consumed(),
            outstanding: signal.outstanding(),
        }
    }
}

/// Point-in-time view of the workshop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkshopSnapshot {
    pub cohort_size: usize,
    pub cohort_arrivals: usize,
    pub group_arrivals: usize,
    pub group_dispatched: bool,
    pub gate_free: bool,
    pub phase: CoordinatorPhase,
    pub stats: WorkshopStats,
    pub wake: SignalCounts,
    pub cohort_dispatch: SignalCounts,
    pub cohort_done: SignalCounts,
    pub cohort_release: SignalCounts,
    pub group_dispatch: SignalCounts,
}

/// Counters, lock and signals shared by every actor
pub struct Workshop {
    state: Mutex<Tally>,
    wake: Signal,
    cohort_dispatch: Signal,
    cohort_done: Signal,
    cohort_release: Signal,
    group_dispatch: Signal,
    group_gate: Gate,
}

impl Workshop {
    /// Create a workshop for a cohort of `cohort_size` members
    pub fn new(cohort_size: usize) -> Self {
        debug!(cohort_size, "Workshop::new: called");
        Self {
            state: Mutex::new(Tally::new(cohort_size)),
            wake: Signal::new("coordinator-wake"),
            cohort_dispatch: Signal::new("cohort-dispatch"),
            cohort_done: Signal::new("cohort-done"),
            cohort_release: Signal::new("cohort-release"),
            group_dispatch: Signal::new("group-dispatch"),
            group_gate: Gate::new("group-formation"),
        }
    }

    // === Cohort worker steps ===

    /// Register a cohort arrival; the arrival completing the cohort wakes the coordinator
    pub async fn cohort_arrive(&self) -> CohortArrival {
        let mut state = self.state.lock().await;
        let arrival = state.arrive_cohort();
        if arrival.quorum {
            debug!(count = arrival.count, "Workshop::cohort_arrive: quorum reached, waking coordinator");
            self.wake.raise();
        }
        arrival
    }

    /// Block until the coordinator dispatches this cohort member
    pub async fn await_cohort_dispatch(&self, cancel: &CancellationToken) -> Result<()> {
        self.cohort_dispatch.wait(cancel).await
    }

    /// Acknowledge that this member finished its activity
    pub fn cohort_complete(&self) {
        self.cohort_done.raise();
    }

    /// Block until the coordinator closes the current round
    pub async fn await_cohort_release(&self, cancel: &CancellationToken) -> Result<()> {
        self.cohort_release.wait(cancel).await
    }

    // === Group worker steps ===

    /// Block until this worker may join the group being formed
    pub async fn enter_group_gate(&self, cancel: &CancellationToken) -> Result<()> {
        self.group_gate.acquire(cancel).await
    }

    /// Register a group arrival
    ///
    /// The third arrival wakes the coordinator and keeps the gate held until
    /// the group has fully departed; earlier arrivals pass the gate on.
    pub async fn group_arrive(&self) -> GroupArrival {
        let mut state = self.state.lock().await;
        let arrival = state.arrive_group();
        if arrival.quorum {
            debug!("Workshop::group_arrive: group formed, waking coordinator");
            self.wake.raise();
        } else {
            self.group_gate.release();
        }
        arrival
    }

    /// Block until the coordinator invites this group member in
    pub async fn await_group_dispatch(&self, cancel: &CancellationToken) -> Result<()> {
        self.group_dispatch.wait(cancel).await
    }

    /// Leave the group; the last member out frees the formation gate
    pub async fn group_depart(&self) -> GroupDeparture {
        let mut state = self.state.lock().await;
        let departure = state.depart_group();
        if departure.group_finished {
            debug!("Workshop::group_depart: group finished, freeing formation gate");
            self.group_gate.release();
        }
        departure
    }

    // === Coordinator steps ===

    /// Sleep until a quorum event wakes the coordinator
    pub async fn await_wake(&self, cancel: &CancellationToken) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            state.set_phase(CoordinatorPhase::Sleeping);
        }
        self.wake.wait(cancel).await
    }

    /// Evaluate both counters under the lock and raise the matching dispatch
    pub async fn evaluate_and_dispatch(&self) -> Dispatch {
        let mut state = self.state.lock().await;
        state.record_wake();
        state.set_phase(CoordinatorPhase::Evaluating);

        let cohort_arrivals = state.cohort_arrivals();
        let group_arrivals = state.group_arrivals();
        let decision = state.evaluate();

        let released = match decision {
            Decision::CohortReady => {
                let released = state.begin_cohort_dispatch();
                state.set_phase(CoordinatorPhase::DispatchingCohort);
                self.cohort_dispatch.raise_n(released);
                released
            }
            Decision::GroupReady => {
                let released = state.begin_group_dispatch();
                state.set_phase(CoordinatorPhase::DispatchingGroup);
                self.group_dispatch.raise_n(released);
                released
            }
            Decision::SpuriousWake => {
                warn!(cohort_arrivals, group_arrivals, "Coordinator woke with no quorum, going back to sleep");
                state.record_spurious_wake();
                state.set_phase(CoordinatorPhase::Sleeping);
                0
            }
        };

        Dispatch {
            decision,
            released,
            cohort_arrivals,
            group_arrivals,
        }
    }

    /// Consume one completion per dispatched member, then release the round
    pub async fn finish_cohort_round(&self, released: usize, cancel: &CancellationToken) -> Result<()> {
        debug!(released, "Workshop::finish_cohort_round: waiting for completions");
        self.cohort_done.wait_n(released, cancel).await?;

        let mut state = self.state.lock().await;
        state.record_cohort_completions(released);
        state.set_phase(CoordinatorPhase::Sleeping);
        self.cohort_release.raise_n(released);
        debug!(released, "Workshop::finish_cohort_round: round closed");
        Ok(())
    }

    /// Mark the coordinator done assisting the current group
    pub async fn finish_group_service(&self) {
        let mut state = self.state.lock().await;
        state.set_phase(CoordinatorPhase::Sleeping);
    }

    // === Observation ===

    /// Consistent view of counters, phase, gate and signal traffic
    pub async fn snapshot(&self) -> WorkshopSnapshot {
        let state = self.state.lock().await;
        WorkshopSnapshot {
            cohort_size: state.cohort_size(),
            cohort_arrivals: state.cohort_arrivals(),
            group_arrivals: state.group_arrivals(),
            group_dispatched: state.group_dispatched(),
            gate_free: self.group_gate.is_free(),
            phase: state.phase(),
            stats: state.stats().clone(),
            wake: SignalCounts::of(&self.wake),
            cohort_dispatch: SignalCounts::of(&self.cohort_dispatch),
            cohort_done: SignalCounts::of(&self.cohort_done),
            cohort_release: SignalCounts::of(&self.cohort_release),
            group_dispatch: SignalCounts::of(&self.group_dispatch),
        }
    }
}
