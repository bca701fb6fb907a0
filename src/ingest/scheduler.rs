// src/ingest/scheduler.rs
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::ingest::snapshot::{Snapshot, SnapshotStore};
use crate::ingest::{CycleError, CycleReport, Pipeline};

#[derive(Clone, Copy, Debug)]
pub struct IngestSchedulerCfg {
    pub interval: Duration,
}

impl Default for IngestSchedulerCfg {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Running,
}

/// Decrements the in-flight counter even if the cycle future is dropped or
/// panics, so the state always returns to Idle.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Drives refresh cycles and owns the published snapshot.
pub struct Scheduler {
    pipeline: Arc<Pipeline>,
    store: SnapshotStore,
    in_flight: AtomicUsize,
    next_cycle: AtomicU64,
}

impl Scheduler {
    pub fn new(pipeline: Arc<Pipeline>, store: SnapshotStore) -> Arc<Self> {
        Arc::new(Self {
            pipeline,
            store,
            in_flight: AtomicUsize::new(0),
            next_cycle: AtomicU64::new(1),
        })
    }

    /// Current published snapshot (never blocks on a running cycle).
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.current()
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn state(&self) -> CycleState {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            CycleState::Running
        } else {
            CycleState::Idle
        }
    }

    /// Run one cycle and publish on success. On failure the previous
    /// snapshot stays current.
    pub async fn refresh(&self) -> Result<CycleReport, CycleError> {
        let _guard = InFlight::enter(&self.in_flight);
        let cycle = self.next_cycle.fetch_add(1, Ordering::SeqCst);
        counter!("ingest_cycles_total").increment(1);

        let report = match self.pipeline.run_cycle().await {
            Ok(r) => r,
            Err(e) => {
                counter!("ingest_cycle_failures_total").increment(1);
                return Err(e);
            }
        };

        let snapshot = Snapshot::new(cycle, report.jobs.clone());
        let published_at = snapshot.generated_at;
        if self.store.publish(snapshot) {
            gauge!("snapshot_jobs").set(report.jobs.len() as f64);
            if let Some(ts) = published_at {
                gauge!("snapshot_published_ts").set(ts.timestamp() as f64);
            }
            info!(
                target: "ingest",
                cycle,
                jobs = report.jobs.len(),
                duplicates = report.duplicates,
                "snapshot published"
            );
        } else {
            warn!(target: "ingest", cycle, "newer snapshot already published; discarding");
        }
        Ok(report)
    }

    /// Fire-and-forget refresh. The returned handle belongs to an observer
    /// task that logs how the cycle ended, including panics.
    pub fn trigger_refresh(self: &Arc<Self>) -> JoinHandle<()> {
        let this = Arc::clone(self);
        let cycle = tokio::spawn(async move { this.refresh().await });
        tokio::spawn(async move {
            match cycle.await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    warn!(target: "ingest", error = %e, "refresh cycle failed; previous snapshot kept")
                }
                Err(e) => {
                    counter!("ingest_cycle_failures_total").increment(1);
                    error!(target: "ingest", error = %e, "refresh cycle crashed; previous snapshot kept")
                }
            }
        })
    }

    /// Immediate refresh, then one per `cfg.interval` until `shutdown`
    /// becomes true or its sender is dropped. Missed ticks are skipped.
    pub fn spawn(
        self: &Arc<Self>,
        cfg: IngestSchedulerCfg,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.trigger_refresh();

            let mut ticker = interval_at(Instant::now() + cfg.interval, cfg.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(
                target: "ingest",
                interval_secs = cfg.interval.as_secs(),
                "scheduler started"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        this.trigger_refresh();
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            info!(target: "ingest", "scheduler stopped");
        })
    }
}
