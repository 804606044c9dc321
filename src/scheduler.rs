//! Auto-refresh loop.
//!
//! [`UpdateScheduler`] runs one [`Cycle`] as soon as it is started and then
//! once per interval. Each cycle runs in its own task: a failure is logged and
//! forgotten, and never touches the timer or the next cycle. At most one cycle
//! is in flight; a tick that lands while one is still running is skipped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{Instrument, error, info, warn};

use crate::catalog::PublishResult;
use crate::error::CycleError;

/// A unit of work the scheduler can drive.
#[async_trait]
pub trait Cycle: Send + Sync + 'static {
    async fn run(&self) -> Result<PublishResult, CycleError>;
}

/// Point-in-time counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStats {
    pub started: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Ticks dropped because a cycle was already in flight.
    pub skipped: u64,
}

#[derive(Default)]
struct Tracker {
    running: AtomicBool,
    started: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
}

/// Read-only view of a scheduler's progress, cheap to clone into handlers.
#[derive(Clone)]
pub struct SchedulerMonitor(Arc<Tracker>);

impl SchedulerMonitor {
    pub fn stats(&self) -> SchedulerStats {
        let t = &self.0;
        SchedulerStats {
            started: t.started.load(Ordering::Relaxed),
            succeeded: t.succeeded.load(Ordering::Relaxed),
            failed: t.failed.load(Ordering::Relaxed),
            skipped: t.skipped.load(Ordering::Relaxed),
        }
    }

    pub fn cycle_in_progress(&self) -> bool {
        self.0.running.load(Ordering::Acquire)
    }
}

/// Records the outcome of one cycle task and clears the in-flight flag.
///
/// A task that unwinds before [`settle`](Self::settle) is counted as failed.
struct CycleGuard<'a> {
    tracker: &'a Tracker,
    settled: bool,
}

impl<'a> CycleGuard<'a> {
    fn new(tracker: &'a Tracker) -> Self {
        Self {
            tracker,
            settled: false,
        }
    }

    fn settle(&mut self, succeeded: bool) {
        let counter = if succeeded {
            &self.tracker.succeeded
        } else {
            &self.tracker.failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.settled = true;
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.tracker.failed.fetch_add(1, Ordering::Relaxed);
            error!("Cycle aborted before completing");
        }
        self.tracker.running.store(false, Ordering::Release);
    }
}

struct Shared<C> {
    cycle: C,
    tracker: Arc<Tracker>,
}

pub struct UpdateScheduler<C> {
    shared: Arc<Shared<C>>,
    interval: Duration,
    timer: Option<JoinHandle<()>>,
}

impl<C: Cycle> UpdateScheduler<C> {
    pub fn new(cycle: C, interval: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                cycle,
                tracker: Arc::new(Tracker::default()),
            }),
            interval,
            timer: None,
        }
    }

    pub fn monitor(&self) -> SchedulerMonitor {
        SchedulerMonitor(self.shared.tracker.clone())
    }

    pub fn stats(&self) -> SchedulerStats {
        self.monitor().stats()
    }

    /// Whether the recurring timer is armed.
    pub fn is_started(&self) -> bool {
        self.timer.is_some()
    }

    /// Runs a cycle now, then arms the recurring timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.timer.is_some() {
            warn!("Scheduler already started");
            return;
        }

        info!(interval_ms = self.interval.as_millis() as u64, "Starting update scheduler");
        trigger(&self.shared);

        let shared = self.shared.clone();
        let period = self.interval;
        self.timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                trigger(&shared);
            }
        }));
    }

    /// Disarms the timer. A cycle already in flight runs to completion.
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            info!("Update scheduler stopped");
        }
    }

    /// Starts a cycle outside the timer, unless one is already running.
    pub fn trigger(&self) -> Option<JoinHandle<()>> {
        trigger(&self.shared)
    }
}

impl<C> Drop for UpdateScheduler<C> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

fn trigger<C: Cycle>(shared: &Arc<Shared<C>>) -> Option<JoinHandle<()>> {
    let tracker = &shared.tracker;
    if tracker
        .running
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        tracker.skipped.fetch_add(1, Ordering::Relaxed);
        warn!("Previous cycle still running, skipping this one");
        return None;
    }

    let cycle_id = tracker.started.fetch_add(1, Ordering::Relaxed) + 1;
    let shared = shared.clone();
    let span = tracing::info_span!("cycle", cycle = cycle_id);

    Some(tokio::spawn(
        async move {
            let mut guard = CycleGuard::new(&shared.tracker);
            let started = Instant::now();

            match shared.cycle.run().await {
                Ok(result) => {
                    guard.settle(true);
                    info!(
                        items_updated = result.items_updated,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Cycle complete"
                    );
                }
                Err(e) => {
                    guard.settle(false);
                    error!(
                        error = %e,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Cycle failed"
                    );
                }
            }
        }
        .instrument(span),
    ))
}
