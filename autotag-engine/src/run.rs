use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a bulk run.
///
/// `queued → running` happens exactly once via an atomic claim;
/// `completed` and `failed` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "queued" => Some(RunStatus::Queued),
            "running" => Some(RunStatus::Running),
            "completed" => Some(RunStatus::Completed),
            "failed" => Some(RunStatus::Failed),
            _ => None,
        }
    }
}

/// Persisted record of one catalog-wide tagging run.
///
/// Counters are monotonic within a run; `cursor` is the opaque
/// pagination token the processor resumes from after a crash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BulkRun {
    pub id: Uuid,
    pub shop: String,
    pub status: RunStatus,
    pub processed: i64,
    pub updated: i64,
    pub errors: i64,
    pub total: i64,
    pub cursor: Option<String>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl BulkRun {
    /// A fresh run waiting in the queue.
    pub fn queued(shop: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            shop: shop.into(),
            status: RunStatus::Queued,
            processed: 0,
            updated: 0,
            errors: 0,
            total: 0,
            cursor: None,
            last_error: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }
}

/// Partial update applied to a persisted run. Unset fields are left
/// untouched; `cursor` distinguishes "set to NULL" from "leave alone".
#[derive(Debug, Clone, Default)]
pub struct RunPatch {
    pub status: Option<RunStatus>,
    pub processed: Option<i64>,
    pub updated: Option<i64>,
    pub errors: Option<i64>,
    pub total: Option<i64>,
    pub cursor: Option<Option<String>>,
    pub last_error: Option<String>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: RunStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets all three progress counters at once.
    pub fn counters(mut self, processed: i64, updated: i64, errors: i64) -> Self {
        self.processed = Some(processed);
        self.updated = Some(updated);
        self.errors = Some(errors);
        self
    }

    pub fn total(mut self, total: i64) -> Self {
        self.total = Some(total);
        self
    }

    pub fn cursor(mut self, cursor: Option<String>) -> Self {
        self.cursor = Some(cursor);
        self
    }

    pub fn last_error(mut self, message: impl Into<String>) -> Self {
        self.last_error = Some(message.into());
        self
    }

    pub fn finished_now(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    /// Applies the patch to an in-memory run record.
    pub fn apply(&self, run: &mut BulkRun) {
        if let Some(status) = self.status {
            run.status = status;
        }
        if let Some(processed) = self.processed {
            run.processed = processed;
        }
        if let Some(updated) = self.updated {
            run.updated = updated;
        }
        if let Some(errors) = self.errors {
            run.errors = errors;
        }
        if let Some(total) = self.total {
            run.total = total;
        }
        if let Some(cursor) = &self.cursor {
            run.cursor = cursor.clone();
        }
        if let Some(message) = &self.last_error {
            run.last_error = Some(message.clone());
        }
        if let Some(finished_at) = self.finished_at {
            run.finished_at = Some(finished_at);
        }
    }
}
