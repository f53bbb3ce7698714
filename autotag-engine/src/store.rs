use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::EngineError;
use crate::run::{BulkRun, RunPatch, RunStatus};

/// Persistence boundary for bulk runs.
///
/// The store owns the only cross-process synchronization in the system:
/// `claim_next` must transition at most one run from `queued` to
/// `running` no matter how many claimers race it.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Creates a new `queued` run for the shop.
    async fn create(&self, shop: &str) -> Result<BulkRun, EngineError>;

    /// The most recently created run for the shop, regardless of state.
    async fn find_latest(&self, shop: &str) -> Result<Option<BulkRun>, EngineError>;

    /// Atomically claims the oldest `queued` run, returning the full
    /// persisted row so processing resumes from its counters. Returns
    /// `None` when the queue is empty or another claimer won the race.
    async fn claim_next(&self) -> Result<Option<BulkRun>, EngineError>;

    /// Requeues every non-terminal `running` run. Called once at process
    /// startup so runs orphaned by a crash are retried rather than lost.
    async fn requeue_orphans(&self) -> Result<u64, EngineError>;

    /// Applies a partial update to a run.
    async fn update(&self, run_id: uuid::Uuid, patch: RunPatch) -> Result<(), EngineError>;

    /// Fetches a run by id.
    async fn get(&self, run_id: uuid::Uuid) -> Result<Option<BulkRun>, EngineError>;
}

/// In-memory run store used by tests and local development.
///
/// A single write lock around the run list makes the claim
/// check-and-swap atomic, the same guarantee the Postgres store gets
/// from its conditional UPDATE.
#[derive(Default, Clone)]
pub struct MemoryRunStore {
    runs: Arc<RwLock<Vec<BulkRun>>>,
}

impl MemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every run, in creation order.
    pub fn all(&self) -> Vec<BulkRun> {
        self.runs.read().clone()
    }
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn create(&self, shop: &str) -> Result<BulkRun, EngineError> {
        let run = BulkRun::queued(shop);
        self.runs.write().push(run.clone());
        Ok(run)
    }

    async fn find_latest(&self, shop: &str) -> Result<Option<BulkRun>, EngineError> {
        let runs = self.runs.read();
        Ok(runs.iter().rev().find(|run| run.shop == shop).cloned())
    }

    async fn claim_next(&self) -> Result<Option<BulkRun>, EngineError> {
        let mut runs = self.runs.write();
        let claimed = runs
            .iter_mut()
            .filter(|run| run.finished_at.is_none())
            .find(|run| run.status == RunStatus::Queued);

        Ok(claimed.map(|run| {
            run.status = RunStatus::Running;
            run.clone()
        }))
    }

    async fn requeue_orphans(&self) -> Result<u64, EngineError> {
        let mut runs = self.runs.write();
        let mut requeued = 0;
        for run in runs
            .iter_mut()
            .filter(|run| run.status == RunStatus::Running && run.finished_at.is_none())
        {
            run.status = RunStatus::Queued;
            requeued += 1;
        }
        Ok(requeued)
    }

    async fn update(&self, run_id: uuid::Uuid, patch: RunPatch) -> Result<(), EngineError> {
        let mut runs = self.runs.write();
        let run = runs
            .iter_mut()
            .find(|run| run.id == run_id)
            .ok_or(EngineError::RunNotFound(run_id))?;
        patch.apply(run);
        Ok(())
    }

    async fn get(&self, run_id: uuid::Uuid) -> Result<Option<BulkRun>, EngineError> {
        let runs = self.runs.read();
        Ok(runs.iter().find(|run| run.id == run_id).cloned())
    }
}
