//! Counting hand-off signal
//!
//! A [`Signal`] is a counting semaphore whose tokens are consumed rather than
//! returned: producers `raise` tokens, each blocked consumer takes exactly one
//! and keeps it. Waiters are served in FIFO order (tokio's semaphore is fair).

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Result, WorkshopError};

/// Counting signal with raise/consume accounting
#[derive(Debug)]
pub struct Signal {
    name: &'static str,
    sem: Semaphore,
    raised: AtomicU64,
    consumed: AtomicU64,
}

impl Signal {
    /// Create a signal with no outstanding tokens
    pub fn new(name: &'static str) -> Self {
        debug!(%name, "Signal::new: called");
        Self {
            name,
            sem: Semaphore::new(0),
            raised: AtomicU64::new(0),
            consumed: AtomicU64::new(0),
        }
    }

    /// Raise one token
    pub fn raise(&self) {
        self.raise_n(1);
    }

    /// Raise `n` tokens at once
    pub fn raise_n(&self, n: usize) {
        debug!(signal = self.name, n, "Signal::raise_n: called");
        self.sem.add_permits(n);
        self.raised.fetch_add(n as u64, Ordering::SeqCst);
    }

    /// Block until a token is available and consume it
    ///
    /// Returns [`WorkshopError::Cancelled`] if `cancel` fires first; no token
    /// is consumed in that case.
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<()> {
        debug!(signal = self.name, "Signal::wait: called");
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(signal = self.name, "Signal::wait: cancelled");
                Err(WorkshopError::Cancelled)
            }
            permit = self.sem.acquire() => {
                let permit = permit.map_err(|_| WorkshopError::SignalClosed { signal: self.name })?;
                permit.forget();
                self.consumed.fetch_add(1, Ordering::SeqCst);
                debug!(signal = self.name, "Signal::wait: consumed token");
                Ok(())
            }
        }
    }

    /// Consume `n` tokens, one at a time
    pub async fn wait_n(&self, n: usize, cancel: &CancellationToken) -> Result<()> {
        debug!(signal = self.name, n, "Signal::wait_n: called");
        for _ in 0..n {
            self.wait(cancel).await?;
        }
        Ok(())
    }

    /// Tokens raised but not yet consumed
    pub fn outstanding(&self) -> usize {
        self.sem.available_permits()
    }

    /// Total tokens ever raised
    pub fn raised(&self) -> u64 {
        self.raised.load(Ordering::SeqCst)
    }

    /// Total tokens ever consumed
    pub fn consumed(&self) -> u64 {
        self.consumed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_consumes_raised_token() {
        let signal = Signal::new("test");
        let cancel = CancellationToken::new();

        signal.raise();
        assert_eq!(signal.outstanding(), 1);

        signal.wait(&cancel).await.unwrap();
        assert_eq!(signal.outstanding(), 0);
        assert_eq!(signal.raised(), 1);
        assert_eq!(signal.consumed(), 1);
    }

    #[tokio::test]
    async fn test_wait_blocks_without_token() {
        let signal = Signal::new("test");
        let cancel = CancellationToken::new();

        let result = tokio::time::timeout(Duration::from_millis(50), signal.wait(&cancel)).await;
        assert!(result.is_err(), "wait should still be blocked");
        assert_eq!(signal.consumed(), 0);
    }

    #[tokio::test]
    async fn test_raise_n_releases_exactly_n_waiters() {
        let signal = Arc::new(Signal::new("test"));
        let cancel = CancellationToken::new();

        let mut waiters = Vec::new();
        for _ in 0..3 {
            let signal = signal.clone();
            let cancel = cancel.clone();
            waiters.push(tokio::spawn(async move { signal.wait(&cancel).await }));
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
        signal.raise_n(2);
        tokio::time::sleep(Duration::from_millis(20)).await;

        let finished = waiters.iter().filter(|w| w.is_finished()).count();
        assert_eq!(finished, 2);
        assert_eq!(signal.consumed(), 2);

        cancel.cancel();
        for waiter in waiters {
            let _ = waiter.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_cancel_unblocks_waiter() {
        let signal = Signal::new("test");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = signal.wait(&cancel).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(signal.consumed(), 0);
    }

    #[tokio::test]
    async fn test_wait_n_consumes_all() {
        let signal = Signal::new("test");
        let cancel = CancellationToken::new();

        signal.raise_n(4);
        signal.wait_n(4, &cancel).await.unwrap();
        assert_eq!(signal.outstanding(), 0);
        assert_eq!(signal.consumed(), 4);
    }
}
