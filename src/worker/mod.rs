//! Background polling workers.
//!
//! Every cache and the subscription coordinator own exactly one [`Worker`]:
//! a tokio task that runs a fetch iteration, then sleeps for a fixed period.
//! The sleep is interruptible through [`Worker::wake`] so that a new
//! registration does not wait a full period, and through
//! [`Worker::shutdown`] so that disposal is prompt.
//!
//! # Loop
//!
//! ```text
//! sleep(initial_delay) ──wake──┐
//!        │                     │
//!        ▼                     ▼
//!   while running:  iteration(liveness) ── Err/panic ──> warn!, continue
//!        │
//!        ▼
//!   select! { wake, sleep(period) }
//! ```
//!
//! An iteration receives a [`Liveness`] handle and must re-check it after
//! every fetch: a result that arrives after disposal is discarded rather
//! than merged.
//!
//! Workers must be spawned from inside a tokio runtime.

use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::constants::{DEFAULT_INITIAL_DELAY, DEFAULT_POLL_PERIOD};

/// Initial delay and period of a polling worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTiming {
    pub initial_delay: Duration,
    pub period: Duration,
}

impl PollTiming {
    pub const fn new(initial_delay: Duration, period: Duration) -> Self {
        Self {
            initial_delay,
            period,
        }
    }
}

impl Default for PollTiming {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_DELAY, DEFAULT_POLL_PERIOD)
    }
}

/// Read-only view of a worker's running flag.
#[derive(Debug, Clone)]
pub struct Liveness {
    running: Arc<AtomicBool>,
}

impl Liveness {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Handle to one long-lived polling task.
///
/// Dropping the handle shuts the worker down; use [`Worker::stop`] to also
/// wait for the task to finish.
#[derive(Debug)]
pub struct Worker {
    name: &'static str,
    running: Arc<AtomicBool>,
    wake: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn a worker running `iteration` according to `timing`.
    ///
    /// Errors returned by an iteration are logged and the loop continues;
    /// a panicking iteration is caught and logged the same way.
    pub fn spawn<F, Fut>(name: &'static str, timing: PollTiming, mut iteration: F) -> Self
    where
        F: FnMut(Liveness) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let wake = Arc::new(Notify::new());
        let liveness = Liveness {
            running: running.clone(),
        };
        let task_wake = wake.clone();

        let handle = tokio::spawn(async move {
            tracing::debug!(target: "worker", "{name} worker started");

            if !timing.initial_delay.is_zero() {
                tokio::select! {
                    () = task_wake.notified() => {}
                    () = tokio::time::sleep(timing.initial_delay) => {}
                }
            }

            while liveness.is_running() {
                match AssertUnwindSafe(iteration(liveness.clone())).catch_unwind().await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        tracing::warn!(target: "worker", "{name} iteration failed: {err:#}");
                    }
                    Err(_) => {
                        tracing::warn!(target: "worker", "{name} iteration panicked");
                    }
                }

                if !liveness.is_running() {
                    break;
                }

                tokio::select! {
                    () = task_wake.notified() => {
                        tracing::trace!(target: "worker", "{name} woken before period elapsed");
                    }
                    () = tokio::time::sleep(timing.period) => {}
                }
            }

            tracing::debug!(target: "worker", "{name} worker stopped");
        });

        Self {
            name,
            running,
            wake,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn liveness(&self) -> Liveness {
        Liveness {
            running: self.running.clone(),
        }
    }

    /// Interrupt the current sleep so the next iteration starts now.
    ///
    /// A wake issued while an iteration is running is remembered and ends
    /// the following sleep immediately.
    pub fn wake(&self) {
        self.wake.notify_one();
    }

    /// Clear the running flag and interrupt the sleep. Does not wait.
    pub fn shutdown(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            tracing::debug!(target: "worker", "{} worker shutting down", self.name);
        }
        self.wake.notify_one();
    }

    /// Shut down and wait for the task to finish its current iteration.
    pub async fn stop(mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                tracing::warn!(
                    target: "worker",
                    "{} worker task ended abnormally: {err}",
                    self.name
                );
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
