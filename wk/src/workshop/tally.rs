//! Lock-guarded counter state
//!
//! `Tally` is the plain data behind the workshop lock. Every mutation returns
//! the post-mutation value so callers decide on wake-ups using a count they
//! know is consistent.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Members per bounded group
pub const GROUP_SIZE: usize = 3;

/// Outcome of the coordinator inspecting both counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// The full cohort is present
    CohortReady,
    /// A group of three is formed and not yet dispatched
    GroupReady,
    /// Neither condition holds; the coordinator re-waits
    SpuriousWake,
}

/// Where the coordinator is in its state machine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinatorPhase {
    #[default]
    Sleeping,
    Evaluating,
    DispatchingCohort,
    DispatchingGroup,
}

/// Running totals for the workshop
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkshopStats {
    pub coordinator_wakes: u64,
    pub spurious_wakes: u64,
    pub cohort_rounds: u64,
    /// Dispatch tokens raised for the cohort
    pub cohort_dispatched: u64,
    /// Completion tokens consumed by the coordinator
    pub cohort_completions: u64,
    pub groups_served: u64,
    /// Dispatch tokens raised for groups
    pub group_dispatched: u64,
    pub group_departures: u64,
    pub peak_cohort_arrivals: usize,
    pub peak_group_arrivals: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CohortArrival {
    pub count: usize,
    /// This arrival completed the cohort
    pub quorum: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupArrival {
    pub count: usize,
    /// This arrival completed a group of three
    pub quorum: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupDeparture {
    pub remaining: usize,
    /// The last member left; the formation gate must be freed
    pub group_finished: bool,
}

/// Counter state guarded by the workshop lock
#[derive(Debug, Clone)]
pub struct Tally {
    cohort_size: usize,
    cohort_arrivals: usize,
    group_arrivals: usize,
    group_dispatched: bool,
    phase: CoordinatorPhase,
    stats: WorkshopStats,
}

impl Tally {
    pub fn new(cohort_size: usize) -> Self {
        debug!(cohort_size, "Tally::new: called");
        Self {
            cohort_size,
            cohort_arrivals: 0,
            group_arrivals: 0,
            group_dispatched: false,
            phase: CoordinatorPhase::Sleeping,
            stats: WorkshopStats::default(),
        }
    }

    pub fn cohort_size(&self) -> usize {
        self.cohort_size
    }

    pub fn cohort_arrivals(&self) -> usize {
        self.cohort_arrivals
    }

    pub fn group_arrivals(&self) -> usize {
        self.group_arrivals
    }

    pub fn group_dispatched(&self) -> bool {
        self.group_dispatched
    }

    pub fn phase(&self) -> CoordinatorPhase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: CoordinatorPhase) {
        debug!(from = ?self.phase, to = ?phase, "Tally::set_phase: called");
        self.phase = phase;
    }

    pub fn stats(&self) -> &WorkshopStats {
        &self.stats
    }

    /// Register a cohort arrival
    pub fn arrive_cohort(&mut self) -> CohortArrival {
        debug_assert!(self.cohort_arrivals < self.cohort_size, "cohort count above quorum");
        self.cohort_arrivals += 1;
        self.stats.peak_cohort_arrivals = self.stats.peak_cohort_arrivals.max(self.cohort_arrivals);
        let arrival = CohortArrival {
            count: self.cohort_arrivals,
            quorum: self.cohort_arrivals == self.cohort_size,
        };
        debug!(?arrival, "Tally::arrive_cohort: called");
        arrival
    }

    /// Register a group arrival
    pub fn arrive_group(&mut self) -> GroupArrival {
        debug_assert!(self.group_arrivals < GROUP_SIZE, "group count above quorum");
        self.group_arrivals += 1;
        self.stats.peak_group_arrivals = self.stats.peak_group_arrivals.max(self.group_arrivals);
        let arrival = GroupArrival {
            count: self.group_arrivals,
            quorum: self.group_arrivals == GROUP_SIZE,
        };
        debug!(?arrival, "Tally::arrive_group: called");
        arrival
    }

    /// Register a group member leaving after being served
    pub fn depart_group(&mut self) -> GroupDeparture {
        if self.group_arrivals == 0 {
            warn!("Tally::depart_group: no group members present, ignoring");
            return GroupDeparture {
                remaining: 0,
                group_finished: false,
            };
        }

        self.group_arrivals -= 1;
        self.stats.group_departures += 1;
        let group_finished = self.group_arrivals == 0;
        if group_finished {
            self.group_dispatched = false;
        }
        let departure = GroupDeparture {
            remaining: self.group_arrivals,
            group_finished,
        };
        debug!(?departure, "Tally::depart_group: called");
        departure
    }

    /// Decide which population to serve, cohort first
    pub fn evaluate(&self) -> Decision {
        let decision = if self.cohort_arrivals == self.cohort_size {
            Decision::CohortReady
        } else if self.group_arrivals == GROUP_SIZE && !self.group_dispatched {
            Decision::GroupReady
        } else {
            Decision::SpuriousWake
        };
        debug!(
            cohort_arrivals = self.cohort_arrivals,
            group_arrivals = self.group_arrivals,
            ?decision,
            "Tally::evaluate: called"
        );
        decision
    }

    pub fn record_wake(&mut self) {
        self.stats.coordinator_wakes += 1;
    }

    pub fn record_spurious_wake(&mut self) {
        self.stats.spurious_wakes += 1;
    }

    /// Close cohort arrivals for this round; returns how many to dispatch
    pub fn begin_cohort_dispatch(&mut self) -> usize {
        let released = self.cohort_arrivals;
        self.cohort_arrivals = 0;
        self.stats.cohort_rounds += 1;
        self.stats.cohort_dispatched += released as u64;
        debug!(released, "Tally::begin_cohort_dispatch: called");
        released
    }

    /// Record the coordinator having consumed `completions` acknowledgments
    pub fn record_cohort_completions(&mut self, completions: usize) {
        self.stats.cohort_completions += completions as u64;
    }

    /// Mark the formed group as dispatched; returns how many to release
    pub fn begin_group_dispatch(&mut self) -> usize {
        self.group_dispatched = true;
        self.stats.groups_served += 1;
        self.stats.group_dispatched += GROUP_SIZE as u64;
        debug!("Tally::begin_group_dispatch: called");
        GROUP_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_cohort_quorum_on_last_arrival() {
        let mut tally = Tally::new(2);

        let first = tally.arrive_cohort();
        assert_eq!(first, CohortArrival { count: 1, quorum: false });
        assert_eq!(tally.evaluate(), Decision::SpuriousWake);

        let second = tally.arrive_cohort();
        assert_eq!(second, CohortArrival { count: 2, quorum: true });
        assert_eq!(tally.evaluate(), Decision::CohortReady);
    }

    #[test]
    fn test_cohort_dispatch_resets_count() {
        let mut tally = Tally::new(3);
        for _ in 0..3 {
            tally.arrive_cohort();
        }

        assert_eq!(tally.begin_cohort_dispatch(), 3);
        assert_eq!(tally.cohort_arrivals(), 0);
        assert_eq!(tally.stats().cohort_rounds, 1);
        assert_eq!(tally.stats().cohort_dispatched, 3);
    }

    #[test]
    fn test_cohort_has_priority_over_group() {
        let mut tally = Tally::new(1);
        for _ in 0..GROUP_SIZE {
            tally.arrive_group();
        }
        tally.arrive_cohort();

        assert_eq!(tally.evaluate(), Decision::CohortReady);
        tally.begin_cohort_dispatch();
        assert_eq!(tally.evaluate(), Decision::GroupReady);
    }

    #[test]
    fn test_dispatched_group_is_not_ready_again() {
        let mut tally = Tally::new(9);
        for _ in 0..GROUP_SIZE {
            tally.arrive_group();
        }
        assert_eq!(tally.begin_group_dispatch(), GROUP_SIZE);
        assert_eq!(tally.evaluate(), Decision::SpuriousWake);
    }

    #[test]
    fn test_last_departure_finishes_group() {
        let mut tally = Tally::new(9);
        for _ in 0..GROUP_SIZE {
            tally.arrive_group();
        }
        tally.begin_group_dispatch();

        assert!(!tally.depart_group().group_finished);
        assert!(!tally.depart_group().group_finished);
        let last = tally.depart_group();
        assert_eq!(last, GroupDeparture { remaining: 0, group_finished: true });
        assert!(!tally.group_dispatched());
    }

    #[test]
    fn test_depart_with_empty_group_is_ignored() {
        let mut tally = Tally::new(9);
        let departure = tally.depart_group();
        assert_eq!(departure.remaining, 0);
        assert!(!departure.group_finished);
        assert_eq!(tally.stats().group_departures, 0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        CohortArrive,
        GroupArrive,
        GroupDepart,
        Coordinate,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::CohortArrive),
            Just(Op::GroupArrive),
            Just(Op::GroupDepart),
            Just(Op::Coordinate),
        ]
    }

    proptest! {
        /// Drives the tally through protocol-legal interleavings: counts stay
        /// bounded and every wake finds a condition to serve.
        #[test]
        fn prop_protocol_interleavings_stay_bounded(
            cohort_size in 1usize..12,
            ops in proptest::collection::vec(op(), 0..300),
        ) {
            let mut tally = Tally::new(cohort_size);
            let mut pending_wakes = 0usize;

            for op in ops {
                match op {
                    Op::CohortArrive => {
                        if tally.cohort_arrivals() < cohort_size {
                            if tally.arrive_cohort().quorum {
                                pending_wakes += 1;
                            }
                        }
                    }
                    Op::GroupArrive => {
                        // The formation gate admits arrivals only while a group is forming
                        if tally.group_arrivals() < GROUP_SIZE && !tally.group_dispatched() {
                            if tally.arrive_group().quorum {
                                pending_wakes += 1;
                            }
                        }
                    }
                    Op::GroupDepart => {
                        if tally.group_dispatched() {
                            tally.depart_group();
                        }
                    }
                    Op::Coordinate => {
                        if pending_wakes > 0 {
                            pending_wakes -= 1;
                            tally.record_wake();
                            match tally.evaluate() {
                                Decision::CohortReady => {
                                    let released = tally.begin_cohort_dispatch();
                                    prop_assert_eq!(released, cohort_size);
                                    tally.record_cohort_completions(released);
                                }
                                Decision::GroupReady => {
                                    prop_assert_eq!(tally.begin_group_dispatch(), GROUP_SIZE);
                                }
                                Decision::SpuriousWake => {
                                    prop_assert!(false, "wake with no condition to serve");
                                }
                            }
                        }
                    }
                }

                prop_assert!(tally.cohort_arrivals() <= cohort_size);
                prop_assert!(tally.group_arrivals() <= GROUP_SIZE);
            }

            let stats = tally.stats();
            prop_assert_eq!(stats.cohort_dispatched, stats.cohort_rounds * cohort_size as u64);
            prop_assert_eq!(stats.group_dispatched, stats.groups_served * GROUP_SIZE as u64);
            prop_assert_eq!(stats.spurious_wakes, 0);
        }
    }
}
