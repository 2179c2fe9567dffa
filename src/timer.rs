//! Scheduled tasks that are cancelled when dropped.
//!
//! Every repeating timer in the app is owned by the view that needs it.
//! Dropping the [`ScheduledTask`] aborts the underlying tokio task, so a
//! timer can never outlive its owner.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::mpsc;
//! use std::time::Duration;
//! use codealarm::timer::ScheduledTask;
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let (tx, rx) = mpsc::channel();
//! let ticker = ScheduledTask::repeating(runtime.handle(), "clock", Duration::from_secs(1), move || {
//!     tx.send(()).is_ok()
//! });
//! // ... later
//! drop(ticker); // no more ticks
//! ```

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// A spawned timer task, aborted on drop.
#[derive(Debug)]
pub struct ScheduledTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Run `on_tick` every `period`, first after one full period.
    ///
    /// The task stops on its own when `on_tick` returns `false`, which is
    /// how callbacks report that their receiver has gone away.
    pub fn repeating<F>(runtime: &Handle, name: &'static str, period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        log::trace!("Starting {} timer every {:?}", name, period);
        let handle = runtime.spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if !on_tick() {
                    break;
                }
            }
        });
        Self { name, handle }
    }

    /// Whether the task has stopped, either on its own or by abort.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.handle.abort();
        log::trace!("Stopped {} timer", self.name);
    }
}
