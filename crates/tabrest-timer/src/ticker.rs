//! Background expiry driven by a tokio interval.
//!
//! The ticker polls [`IdleTimers::take_due`] on a fixed period and hands
//! each non-empty batch to a callback. The callback runs on the runtime's
//! worker, so it should hand work off rather than block.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use tabrest_core::{SharedClock, TabId};

use crate::error::{TimerError, TimerResult};
use crate::idle::IdleTimers;

/// Default polling period.
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// A running expiry loop.
pub struct Ticker {
    shutdown: Arc<Notify>,
    handle: Mutex<Option<JoinHandle<()>>>,
    period: Duration,
}

impl Ticker {
    /// Spawn the loop on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Fails when called outside a runtime or with a zero period.
    pub fn spawn<F>(
        timers: Arc<IdleTimers>,
        clock: SharedClock,
        period: Duration,
        mut on_due: F,
    ) -> TimerResult<Self>
    where
        F: FnMut(Vec<TabId>) + Send + 'static,
    {
        if period.is_zero() {
            return Err(TimerError::Ticker("tick period must be positive".to_string()));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TimerError::Ticker(e.to_string()))?;

        let shutdown = Arc::new(Notify::new());
        let stop = Arc::clone(&shutdown);

        let handle = runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(period_ms = period.as_millis() as u64, "Idle ticker started");

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let due = timers.take_due(clock.now());
                        if !due.is_empty() {
                            debug!(count = due.len(), "Dispatching expired timers");
                            on_due(due);
                        }
                    }
                    _ = stop.notified() => break,
                }
            }

            info!("Idle ticker stopped");
        });

        Ok(Self {
            shutdown,
            handle: Mutex::new(Some(handle)),
            period,
        })
    }

    /// The polling period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Whether the loop is still running.
    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the loop and wait for it to exit.
    pub async fn stop(&self) {
        self.shutdown.notify_one();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Idle ticker exited abnormally");
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ticker")
            .field("period", &self.period)
            .field("running", &self.is_running())
            .finish()
    }
}
