//! Single-flight timers that deliver events into an event loop.
//!
//! Scheduling cancels whatever the timer had pending. Firings carry a
//! generation number so one that raced a cancel is dropped on arrival.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, instrument};

/// A timer firing, to be passed back to [`Timer::accept`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<E> {
    generation: u64,
    event: E,
}

/// A cancellable one-shot or repeating timer.
#[derive(Debug)]
pub struct Timer<E> {
    tx: mpsc::UnboundedSender<Fired<E>>,
    generation: u64,
    pending: Option<AbortHandle>,
    repeating: bool,
}

impl<E: Send + 'static> Timer<E> {
    /// Creates an idle timer that fires into `tx`.
    pub fn new(tx: mpsc::UnboundedSender<Fired<E>>) -> Self {
        Self {
            tx,
            generation: 0,
            pending: None,
            repeating: false,
        }
    }

    /// Fires `event` once after `delay`, replacing anything pending.
    #[instrument(skip(self, event))]
    pub fn schedule(&mut self, delay: Duration, event: E) {
        self.cancel();
        let generation = self.generation;
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Fired { generation, event });
        });
        self.pending = Some(handle.abort_handle());
        self.repeating = false;
    }

    /// Fires `event` every `period` until cancelled, replacing anything
    /// pending. The first firing comes one period from now.
    #[instrument(skip(self, event))]
    pub fn repeat(&mut self, period: Duration, event: E)
    where
        E: Clone,
    {
        self.cancel();
        let generation = self.generation;
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            loop {
                ticks.tick().await;
                if tx
                    .send(Fired {
                        generation,
                        event: event.clone(),
                    })
                    .is_err()
                {
                    break;
                }
            }
        });
        self.pending = Some(handle.abort_handle());
        self.repeating = true;
    }

    /// Cancels the pending firing, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            debug!(generation = self.generation, "Cancelling timer");
            handle.abort();
        }
        self.generation += 1;
    }

    /// Whether a firing is scheduled.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Unwraps a firing from this timer, `None` when it is stale.
    pub fn accept(&mut self, fired: Fired<E>) -> Option<E> {
        if fired.generation != self.generation {
            debug!(
                stale = fired.generation,
                current = self.generation,
                "Dropping stale firing"
            );
            return None;
        }
        if !self.repeating {
            self.pending = None;
        }
        Some(fired.event)
    }
}

impl<E> Drop for Timer<E> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
