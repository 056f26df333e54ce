//! Concurrency primitives for the dispatch loop.
//!
//! [`AdmissionGate`] bounds how many processing tasks are active at once and
//! [`CompletionBarrier`] lets the dispatcher wait for every task it launched.
//! Both hand out RAII guards, so a task gives its slot back on every exit
//! path, panics included.

use crate::error::UrlCountError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore};

/// Counting semaphore with a fixed number of admission tokens.
///
/// No worker is created up front: a caller suspends in [`acquire`] while all
/// tokens are held, so launching one task per token yields at most
/// `min(capacity, submitted)` live tasks.
///
/// [`acquire`]: AdmissionGate::acquire
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl AdmissionGate {
    /// Create a gate with `capacity` tokens.
    ///
    /// A capacity of zero would deadlock the first `acquire`, so it is
    /// raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait until a token is free and take it.
    ///
    /// # Errors
    ///
    /// Only fails if the semaphore was closed, which this type never does.
    pub async fn acquire(&self) -> Result<AdmissionToken, UrlCountError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| UrlCountError::internal(format!("admission gate closed: {}", e)))?;
        Ok(AdmissionToken { _permit: permit })
    }

    /// Total number of tokens.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tokens currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Tokens currently held.
    pub fn held(&self) -> usize {
        self.capacity - self.available()
    }
}

/// One unit of admission; the token goes back to its gate when dropped.
#[derive(Debug)]
pub struct AdmissionToken {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionToken {
    /// Give the token back now.
    pub fn release(self) {}
}

#[derive(Debug, Default)]
struct BarrierState {
    pending: AtomicUsize,
    idle: Notify,
}

/// Wait-group style barrier over a dynamic set of tasks.
///
/// Each [`register`] adds one pending unit and returns a guard; dropping the
/// guard marks the unit done. [`wait`] resolves once nothing is pending.
///
/// [`register`]: CompletionBarrier::register
/// [`wait`]: CompletionBarrier::wait
#[derive(Debug, Clone, Default)]
pub struct CompletionBarrier {
    state: Arc<BarrierState>,
}

impl CompletionBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one pending unit of work.
    pub fn register(&self) -> CompletionGuard {
        self.state.pending.fetch_add(1, Ordering::AcqRel);
        CompletionGuard {
            state: Arc::clone(&self.state),
        }
    }

    /// Units registered and not yet done.
    pub fn pending(&self) -> usize {
        self.state.pending.load(Ordering::Acquire)
    }

    /// Wait until every registered unit is done.
    pub async fn wait(&self) {
        loop {
            // Created before the check so a wakeup between the two is not lost.
            let idle = self.state.idle.notified();
            if self.pending() == 0 {
                return;
            }
            idle.await;
        }
    }
}

/// Marks its unit of work done when dropped.
#[derive(Debug)]
pub struct CompletionGuard {
    state: Arc<BarrierState>,
}

impl CompletionGuard {
    /// Signal completion now.
    pub fn done(self) {}
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if self.state.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.state.idle.notify_waiters();
        }
    }
}
