//! Shared workshop state
//!
//! - **Tally:** the two arrival counters plus coordinator phase and stats
//! - **Workshop:** the lock around the tally and the hand-off signals

mod core;
mod tally;

pub use core::{Dispatch, SignalCounts, Workshop, WorkshopSnapshot};
pub use tally::{
    CohortArrival, CoordinatorPhase, Decision, GROUP_SIZE, GroupArrival, GroupDeparture, Tally, WorkshopStats,
};
