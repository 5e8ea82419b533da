//! Workshop - a coordinator serving a full cohort and groups of three
//!
//! A single coordinator sleeps until one of two populations needs it:
//!
//! - the **cohort**: all `N` members must be back before they are dispatched
//!   together, and the coordinator waits for every one of them to finish;
//! - the **group workers**: any three of `M` form a group, groups are served
//!   one at a time, and the cohort wins when both are ready.
//!
//! Everything is coordinated with counting semaphores: one lock around the
//! two counters, a wake signal, dispatch and completion signals, and the
//! group formation gate.
//!
//! # Modules
//!
//! - [`sync`]: counting [`Signal`](sync::Signal) and binary [`Gate`](sync::Gate)
//! - [`workshop`]: the shared [`Workshop`] state and its protocol steps
//! - [`actors`]: coordinator, cohort and group worker loops
//! - [`pacing`]: activity delays
//! - [`events`]: event bus and console narrator
//! - [`driver`]: spawning and stopping all actors
//! - [`config`], [`cli`], [`error`]

pub mod actors;
pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod events;
pub mod pacing;
pub mod sync;
pub mod workshop;

/// Members of the full cohort
pub const DEFAULT_COHORT_SIZE: usize = 9;

/// Workers competing for groups of three
pub const DEFAULT_GROUP_WORKERS: usize = 19;

pub use config::Config;
pub use driver::WorkshopRuntime;
pub use error::{Result, WorkshopError};
pub use events::{ActorId, EventBus, WorkshopEvent};
pub use pacing::{InstantPacer, Pacer, RandomPacer};
pub use workshop::{Decision, Workshop, WorkshopSnapshot};
