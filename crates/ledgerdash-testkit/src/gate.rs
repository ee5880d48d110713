//! Call gates for interleaving tests
//!
//! A [`Gate`] parks ledger calls until the test releases them, which makes
//! "while a refresh is in flight" scenarios deterministic.

use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Notify, Semaphore};

/// Parks calls until released.
#[derive(Debug)]
pub struct Gate {
    arrivals: AtomicUsize,
    arrived: Notify,
    permits: Semaphore,
}

impl Gate {
    pub(crate) fn new() -> Self {
        Self {
            arrivals: AtomicUsize::new(0),
            arrived: Notify::new(),
            permits: Semaphore::new(0),
        }
    }

    /// Block the caller until a permit is released or the gate opens.
    pub(crate) async fn pass(&self) {
        self.arrivals.fetch_add(1, Ordering::SeqCst);
        self.arrived.notify_waiters();
        // A closed semaphore means the gate is open.
        if let Ok(permit) = self.permits.acquire().await {
            permit.forget();
        }
    }

    /// Calls that have reached the gate so far.
    pub fn arrivals(&self) -> usize {
        self.arrivals.load(Ordering::SeqCst)
    }

    /// Wait until at least `count` calls have reached the gate.
    pub async fn wait_for_arrivals(&self, count: usize) {
        loop {
            let notified = self.arrived.notified();
            if self.arrivals() >= count {
                return;
            }
            notified.await;
        }
    }

    /// Let `count` parked (or future) calls through, in arrival order.
    pub fn release(&self, count: usize) {
        self.permits.add_permits(count);
    }

    /// Let every current and future call through.
    pub fn open(&self) {
        self.permits.close();
    }
}
