//! Cancelable periodic background task
//!
//! Drives both the loudness metering loop and the countdown ticker. The
//! first tick fires one period after spawning; ticks missed while the
//! runtime was busy are skipped rather than replayed in a burst.

use std::ops::ControlFlow;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Shortest accepted tick period
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle to a running periodic task. Dropping it aborts the task.
#[derive(Debug)]
pub struct PeriodicTask {
    name: &'static str,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Spawn `on_tick` every `period` until it breaks or the task is cancelled.
    ///
    /// Periods shorter than [`MIN_PERIOD`] are raised to it. Must be called
    /// from within a tokio runtime.
    pub fn spawn<F>(name: &'static str, period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        if period < MIN_PERIOD {
            warn!("{} period {:?} too short, using {:?}", name, period, MIN_PERIOD);
        }
        let period = period.max(MIN_PERIOD);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            debug!("{} task started ({:?} period)", name, period);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = interval.tick() => {
                        if on_tick().is_break() {
                            break;
                        }
                    }
                }
            }

            debug!("{} task stopped", name);
        });

        Self {
            name,
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// True once the loop has exited (broke, cancelled or aborted)
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signal shutdown and abort; no tick runs after this returns
    /// unless one was already executing on another worker.
    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.handle.abort();
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.shutdown();
    }
}
