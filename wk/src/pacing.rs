//! Activity pacing
//!
//! The protocol treats every activity (being away, delivering, working,
//! being helped, helping) as an opaque delay. A [`Pacer`] supplies those
//! delays so tests can make them instant or gate them by hand.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::debug;

use crate::config::{DelayRange, TimingConfig};

/// Source of activity delays
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Cohort member absence between rounds
    async fn away(&self, worker: usize);

    /// Cohort member activity after dispatch
    async fn deliver(&self, worker: usize);

    /// Group worker independent work
    async fn work(&self, worker: usize);

    /// Group member being helped
    async fn receive_assistance(&self, worker: usize);

    /// Coordinator helping a group
    async fn assist(&self);
}

/// Sleeps for durations drawn uniformly from the configured ranges
pub struct RandomPacer {
    timing: TimingConfig,
}

impl RandomPacer {
    pub fn new(timing: TimingConfig) -> Self {
        debug!(?timing, "RandomPacer::new: called");
        Self { timing }
    }

    // The thread-local rng is not Send, so draw before awaiting
    fn draw(range: DelayRange) -> Duration {
        let ms = if range.min >= range.max {
            range.min
        } else {
            rand::rng().random_range(range.min..=range.max)
        };
        Duration::from_millis(ms)
    }
}

#[async_trait]
impl Pacer for RandomPacer {
    async fn away(&self, worker: usize) {
        let delay = Self::draw(self.timing.away_ms);
        debug!(worker, ?delay, "RandomPacer::away");
        tokio::time::sleep(delay).await;
    }

    async fn deliver(&self, worker: usize) {
        let delay = Self::draw(self.timing.delivery_ms);
        debug!(worker, ?delay, "RandomPacer::deliver");
        tokio::time::sleep(delay).await;
    }

    async fn work(&self, worker: usize) {
        let delay = Self::draw(self.timing.work_ms);
        debug!(worker, ?delay, "RandomPacer::work");
        tokio::time::sleep(delay).await;
    }

    async fn receive_assistance(&self, worker: usize) {
        debug!(worker, "RandomPacer::receive_assistance");
        tokio::time::sleep(self.timing.assistance()).await;
    }

    async fn assist(&self) {
        debug!("RandomPacer::assist");
        tokio::time::sleep(self.timing.assist()).await;
    }
}

/// Zero-delay pacer; yields so other actors get scheduled
#[derive(Default)]
pub struct InstantPacer;

#[async_trait]
impl Pacer for InstantPacer {
    async fn away(&self, _worker: usize) {
        tokio::task::yield_now().await;
    }

    async fn deliver(&self, _worker: usize) {
        tokio::task::yield_now().await;
    }

    async fn work(&self, _worker: usize) {
        tokio::task::yield_now().await;
    }

    async fn receive_assistance(&self, _worker: usize) {
        tokio::task::yield_now().await;
    }

    async fn assist(&self) {
        tokio::task::yield_now().await;
    }
}
