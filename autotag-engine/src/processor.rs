use std::sync::Arc;

use tracing::{debug, error, info};

use autotag_catalog::CatalogSource;
use autotag_rules::{RuleEngine, RuleProvider};

use crate::error::EngineError;
use crate::run::{BulkRun, RunPatch, RunStatus};
use crate::store::RunStore;

struct Progress {
    processed: i64,
    updated: i64,
    errors: i64,
    cursor: Option<String>,
}

impl Progress {
    /// Counters come from the persisted row so a requeued run resumes
    /// where it stopped, never from zero.
    fn resume_from(run: &BulkRun) -> Self {
        Self {
            processed: run.processed,
            updated: run.updated,
            errors: run.errors,
            cursor: run.cursor.clone(),
        }
    }
}

/// Drives claimed runs to a terminal state.
///
/// All collaborators are injected; the processor holds no global state.
pub struct RunProcessor {
    catalog: Arc<dyn CatalogSource>,
    rules: Arc<dyn RuleProvider>,
    runs: Arc<dyn RunStore>,
}

impl RunProcessor {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        rules: Arc<dyn RuleProvider>,
        runs: Arc<dyn RunStore>,
    ) -> Self {
        Self {
            catalog,
            rules,
            runs,
        }
    }

    /// Claims and processes runs until the queue is empty, strictly one
    /// at a time, oldest first. Returns how many runs reached a terminal
    /// state.
    pub async fn drain(&self) -> Result<u64, EngineError> {
        let mut drained = 0;
        while let Some(run) = self.runs.claim_next().await? {
            info!(run_id = %run.id, shop = %run.shop, "claimed bulk run");
            self.process(run).await;
            drained += 1;
        }
        Ok(drained)
    }

    /// Drives one claimed run to `completed` or `failed`. Never returns
    /// an error: every failure is captured into the run's persisted
    /// state.
    pub async fn process(&self, run: BulkRun) {
        let mut progress = Progress::resume_from(&run);

        match self.page_loop(&run, &mut progress).await {
            Ok(()) => {
                let patch = RunPatch::new()
                    .status(RunStatus::Completed)
                    .finished_now()
                    .counters(progress.processed, progress.updated, progress.errors)
                    .total(progress.processed)
                    .cursor(progress.cursor.clone());
                if let Err(err) = self.runs.update(run.id, patch).await {
                    error!(run_id = %run.id, error = %err, "failed to finalize bulk run");
                    return;
                }
                info!(
                    run_id = %run.id,
                    shop = %run.shop,
                    processed = progress.processed,
                    updated = progress.updated,
                    errors = progress.errors,
                    "bulk run completed"
                );
            }
            Err(err) => {
                error!(run_id = %run.id, shop = %run.shop, error = %err, "bulk run failed");
                let patch = RunPatch::new()
                    .status(RunStatus::Failed)
                    .finished_now()
                    .last_error(err.to_string())
                    .counters(progress.processed, progress.updated, progress.errors)
                    .total(progress.processed)
                    .cursor(progress.cursor.clone());
                if let Err(update_err) = self.runs.update(run.id, patch).await {
                    error!(run_id = %run.id, error = %update_err, "failed to record bulk run failure");
                }
            }
        }
    }

    async fn page_loop(&self, run: &BulkRun, progress: &mut Progress) -> Result<(), EngineError> {
        // A run applies a frozen rule snapshot: rules are fetched once,
        // so edits during a long run do not retroactively affect it.
        let rules = self.rules.list_enabled(&run.shop).await?;
        let engine = RuleEngine::new(rules);

        loop {
            let page = self
                .catalog
                .fetch_page(&run.shop, progress.cursor.as_deref())
                .await?;

            for product in &page.products {
                progress.processed += 1;

                let diff = engine.diff(product);
                if diff.changed {
                    match self
                        .catalog
                        .write_tags(&run.shop, &product.id, &diff.after_tags)
                        .await
                    {
                        Ok(_) => progress.updated += 1,
                        Err(err) => {
                            // One bad product never aborts the run.
                            debug!(run_id = %run.id, product_id = %product.id, error = %err, "product update failed");
                            progress.errors += 1;
                            self.runs
                                .update(run.id, RunPatch::new().last_error(err.to_string()))
                                .await?;
                        }
                    }
                }

                // Durability over throughput: a crash loses at most one
                // product's worth of progress.
                self.runs
                    .update(
                        run.id,
                        RunPatch::new().counters(
                            progress.processed,
                            progress.updated,
                            progress.errors,
                        ),
                    )
                    .await?;
            }

            progress.cursor = page.page_info.end_cursor.clone();
            self.runs
                .update(
                    run.id,
                    RunPatch::new()
                        .cursor(progress.cursor.clone())
                        .total(progress.processed),
                )
                .await?;

            if !page.page_info.has_next_page {
                break;
            }
        }

        Ok(())
    }
}
