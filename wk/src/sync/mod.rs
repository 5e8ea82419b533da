//! Counting synchronization primitives
//!
//! - **Signal:** counting hand-off; raised tokens are consumed by waiters
//! - **Gate:** binary token that any actor may release

mod gate;
mod signal;

pub use gate::Gate;
pub use signal::Signal;
