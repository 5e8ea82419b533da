//! Binary formation gate
//!
//! Unlike a mutex guard, the gate may be released by a different actor than
//! the one that acquired it, so holders are not tracked.

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Result, WorkshopError};

/// Binary token: free or held
#[derive(Debug)]
pub struct Gate {
    name: &'static str,
    sem: Semaphore,
}

impl Gate {
    /// Create a gate in the free state
    pub fn new(name: &'static str) -> Self {
        debug!(%name, "Gate::new: called");
        Self {
            name,
            sem: Semaphore::new(1),
        }
    }

    /// Block until the gate is free, then hold it
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
        debug!(gate = self.name, "Gate::acquire: called");
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(WorkshopError::Cancelled),
            permit = self.sem.acquire() => {
                let permit = permit.map_err(|_| WorkshopError::SignalClosed { signal: self.name })?;
                permit.forget();
                debug!(gate = self.name, "Gate::acquire: held");
                Ok(())
            }
        }
    }

    /// Free the gate
    ///
    /// Callers release while holding the workshop lock, so the free check
    /// cannot race another release. Releasing a free gate is ignored.
    pub fn release(&self) {
        if self.is_free() {
            warn!(gate = self.name, "Gate::release: gate already free, ignoring");
            return;
        }
        debug!(gate = self.name, "Gate::release: freed");
        self.sem.add_permits(1);
    }

    pub fn is_free(&self) -> bool {
        self.sem.available_permits() > 0
    }
}
