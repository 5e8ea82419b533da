//! Workshop actors
//!
//! Each actor is a loop over [`Workshop`](crate::workshop::Workshop) steps and
//! [`Pacer`](crate::pacing::Pacer) activities. Every blocking point races the
//! actor's cancellation token; cancellation ends the loop cleanly.

mod cohort;
mod coordinator;
mod group;

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::{Result, WorkshopError};

pub use cohort::CohortWorker;
pub use coordinator::Coordinator;
pub use group::GroupWorker;

/// Run `fut` unless `cancel` fires first
pub(crate) async fn cancellable<F: Future>(cancel: &CancellationToken, fut: F) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(WorkshopError::Cancelled),
        out = fut => Ok(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancellable_passes_output_through() {
        let cancel = CancellationToken::new();
        let out = cancellable(&cancel, async { 42 }).await.unwrap();
        assert_eq!(out, 42);
    }

    #[tokio::test]
    async fn test_cancellable_stops_pending_future() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = cancellable(&cancel, std::future::pending::<()>()).await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
