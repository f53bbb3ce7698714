//! Bulk run engine for the autotag system.
//!
//! A bulk run applies the shop's enabled rule set across the whole
//! catalog, page by page, with crash-safe progress tracking: runs are
//! claimed atomically from a FIFO queue, progress is persisted after
//! every product, and runs orphaned by a process restart are requeued at
//! startup and resumed from their last persisted cursor.

mod error;
mod processor;
mod repository;
mod run;
mod store;
mod summary;
mod tagging;
mod worker;

pub use error::EngineError;
pub use processor::RunProcessor;
pub use repository::PgRunStore;
pub use run::{BulkRun, RunPatch, RunStatus};
pub use store::{MemoryRunStore, RunStore};
pub use summary::{automation_status, recent_rules, AutomationStatus, RuleSummary};
pub use tagging::{apply_rules_to_product, preview_rule, ApplyOutcome};
pub use worker::{BulkRunWorker, WorkerConfig};
