use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::EngineError;
use crate::processor::RunProcessor;
use crate::run::BulkRun;
use crate::store::RunStore;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Fixed cadence between queue-drain passes.
    pub poll_interval: Duration,
}

impl WorkerConfig {
    /// Derives the worker cadence from the process configuration.
    pub fn from_core(config: &autotag_core::config::CoreConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Background worker that drains the bulk-run queue.
///
/// Wakes on a fixed interval and on explicit triggers; each wake drains
/// the whole queue before sleeping again. Execution is single-flight:
/// the `draining` guard makes a wake that arrives mid-drain a no-op,
/// and the guard is owned by this instance, not a process-wide global.
#[derive(Clone)]
pub struct BulkRunWorker {
    processor: Arc<RunProcessor>,
    runs: Arc<dyn RunStore>,
    notify: Arc<Notify>,
    draining: Arc<AtomicBool>,
    shutting_down: Arc<AtomicBool>,
    poll_interval: Duration,
}

impl BulkRunWorker {
    pub fn new(processor: Arc<RunProcessor>, runs: Arc<dyn RunStore>, config: WorkerConfig) -> Self {
        Self {
            processor,
            runs,
            notify: Arc::new(Notify::new()),
            draining: Arc::new(AtomicBool::new(false)),
            shutting_down: Arc::new(AtomicBool::new(false)),
            poll_interval: config.poll_interval,
        }
    }

    /// Creates a `queued` run for the shop and nudges the worker.
    pub async fn enqueue(&self, shop: &str) -> Result<BulkRun, EngineError> {
        let run = self.runs.create(shop).await?;
        info!(run_id = %run.id, shop, "bulk run enqueued");
        self.wake();
        Ok(run)
    }

    /// Nudges the worker to process immediately instead of waiting for
    /// the next tick.
    pub fn wake(&self) {
        self.notify.notify_one();
    }

    /// Runs one drain pass. Returns `false` without doing anything when
    /// another pass is already in flight; that pass will keep claiming
    /// until the queue is empty.
    pub async fn run_pass(&self) -> bool {
        if self
            .draining
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("bulk run drain already in progress");
            return false;
        }

        let result = self.processor.drain().await;
        self.draining.store(false, Ordering::SeqCst);

        if let Err(err) = result {
            error!(error = %err, "bulk run worker pass failed");
        }
        true
    }

    /// Spawns the worker loop: requeues orphaned runs once, drains the
    /// queue, then keeps waking on every tick or explicit trigger until
    /// shutdown.
    pub fn start(&self) -> JoinHandle<()> {
        let worker = self.clone();
        tokio::spawn(async move {
            match worker.runs.requeue_orphans().await {
                Ok(requeued) if requeued > 0 => {
                    info!(requeued, "requeued orphaned bulk runs");
                }
                Ok(_) => {}
                Err(err) => {
                    error!(error = %err, "failed to requeue orphaned bulk runs");
                }
            }

            worker.run_pass().await;

            let mut ticker = tokio::time::interval(worker.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick of a fresh interval fires immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = worker.notify.notified() => {}
                }

                if worker.shutting_down.load(Ordering::Relaxed) {
                    break;
                }

                worker.run_pass().await;
            }
        })
    }

    /// Signals the worker loop to stop after the current pass.
    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::Relaxed);
        self.notify.notify_waiters();
        // Stores a wake permit for a loop that is mid-pass rather than
        // parked on the notifier.
        self.notify.notify_one();
    }
}
