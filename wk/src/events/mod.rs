//! Event bus for workshop narration
//!
//! Actors never print. Every transition is emitted onto the [`EventBus`];
//! the console [`Narrator`] is one subscriber, tests are another. With no
//! subscribers the run is silent.
//!
//! ```text
//!   Coordinator      CohortWorker      GroupWorker
//!       │                 │                 │
//!       └──── emit ───────┴──── emit ───────┘
//!                         ↓
//!              ┌─────────────────────┐
//!              │      EVENT BUS      │
//!              │ (tokio broadcast)   │
//!              └─────────────────────┘
//!                 ↓               ↓
//!            Narrator          tests
//! ```

mod bus;
mod narrator;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventEmitter, create_event_bus};
pub use narrator::{NarrationFormat, Narrator, spawn_narrator};
pub use types::{ActorId, EventLogEntry, WorkshopEvent};
