//! Workshop error types

use thiserror::Error;

/// Errors surfaced by the workshop actors and primitives
#[derive(Debug, Error)]
pub enum WorkshopError {
    /// The actor's cancellation token fired while it was blocked
    #[error("Cancelled while waiting")]
    Cancelled,

    /// The underlying semaphore was closed
    #[error("Signal closed: {signal}")]
    SignalClosed { signal: &'static str },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An actor task panicked or was aborted
    #[error("Actor task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl WorkshopError {
    /// True when the error only reflects a requested shutdown
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkshopError::Cancelled)
    }
}

/// Convenience alias for workshop results
pub type Result<T> = std::result::Result<T, WorkshopError>;
