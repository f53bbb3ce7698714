use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder};
use uuid::Uuid;

use autotag_core::config::CoreConfig;
use autotag_core::db::DatabasePool;
use autotag_core::errors::Result as CoreResult;

use crate::error::EngineError;
use crate::run::{BulkRun, RunPatch, RunStatus};
use crate::store::RunStore;

/// Database-backed run store.
///
/// The queue is one physical table; rows carry `shop`. The claim is a
/// single conditional UPDATE so two racing claimers can never both win,
/// and `FOR UPDATE SKIP LOCKED` keeps a concurrent claimer from blocking
/// on the row being taken. Schema migrations are managed outside this
/// crate; the store assumes the `bulk_runs` table exists.
#[derive(Clone)]
pub struct PgRunStore {
    pool: DatabasePool,
}

impl PgRunStore {
    /// Builds the store from an existing database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Connects to the database using the supplied configuration.
    pub async fn from_config(config: &CoreConfig) -> CoreResult<Self> {
        let pool = DatabasePool::connect(config).await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl RunStore for PgRunStore {
    async fn create(&self, shop: &str) -> Result<BulkRun, EngineError> {
        let run = BulkRun::queued(shop);
        let row = sqlx::query_as::<_, BulkRunRow>(
            r#"
            INSERT INTO bulk_runs (
                id, shop, status, processed, updated, errors, total,
                cursor, last_error, created_at, finished_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, shop, status, processed, updated, errors, total,
                cursor, last_error, created_at, finished_at
            "#,
        )
        .bind(run.id)
        .bind(&run.shop)
        .bind(run.status.as_str())
        .bind(run.processed)
        .bind(run.updated)
        .bind(run.errors)
        .bind(run.total)
        .bind(&run.cursor)
        .bind(&run.last_error)
        .bind(run.created_at)
        .bind(run.finished_at)
        .fetch_one(self.pool.inner())
        .await?;

        row.try_into()
    }

    async fn find_latest(&self, shop: &str) -> Result<Option<BulkRun>, EngineError> {
        let row = sqlx::query_as::<_, BulkRunRow>(
            r#"
            SELECT id, shop, status, processed, updated, errors, total,
                cursor, last_error, created_at, finished_at
            FROM bulk_runs
            WHERE shop = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(shop)
        .fetch_optional(self.pool.inner())
        .await?;

        row.map(BulkRun::try_from).transpose()
    }

    async fn claim_next(&self) -> Result<Option<BulkRun>, EngineError> {
        let row = sqlx::query_as::<_, BulkRunRow>(
            r#"
            UPDATE bulk_runs SET status = 'running'
            WHERE id = (
                SELECT id FROM bulk_runs
                WHERE status = 'queued' AND finished_at IS NULL
                ORDER BY created_at ASC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            ) AND status = 'queued'
            RETURNING id, shop, status, processed, updated, errors, total,
                cursor, last_error, created_at, finished_at
            "#,
        )
        .fetch_optional(self.pool.inner())
        .await?;

        row.map(BulkRun::try_from).transpose()
    }

    async fn requeue_orphans(&self) -> Result<u64, EngineError> {
        let result = sqlx::query(
            r#"
            UPDATE bulk_runs SET status = 'queued'
            WHERE status = 'running' AND finished_at IS NULL
            "#,
        )
        .execute(self.pool.inner())
        .await?;

        Ok(result.rows_affected())
    }

    async fn update(&self, run_id: Uuid, patch: RunPatch) -> Result<(), EngineError> {
        let mut builder = QueryBuilder::new("UPDATE bulk_runs SET id = id");

        if let Some(status) = patch.status {
            builder.push(", status = ");
            builder.push_bind(status.as_str());
        }
        if let Some(processed) = patch.processed {
            builder.push(", processed = ");
            builder.push_bind(processed);
        }
        if let Some(updated) = patch.updated {
            builder.push(", updated = ");
            builder.push_bind(updated);
        }
        if let Some(errors) = patch.errors {
            builder.push(", errors = ");
            builder.push_bind(errors);
        }
        if let Some(total) = patch.total {
            builder.push(", total = ");
            builder.push_bind(total);
        }
        if let Some(cursor) = &patch.cursor {
            builder.push(", cursor = ");
            builder.push_bind(cursor.clone());
        }
        if let Some(last_error) = &patch.last_error {
            builder.push(", last_error = ");
            builder.push_bind(last_error.clone());
        }
        if let Some(finished_at) = patch.finished_at {
            builder.push(", finished_at = ");
            builder.push_bind(finished_at);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(run_id);

        let result = builder.build().execute(self.pool.inner()).await?;
        if result.rows_affected() == 0 {
            return Err(EngineError::RunNotFound(run_id));
        }
        Ok(())
    }

    async fn get(&self, run_id: Uuid) -> Result<Option<BulkRun>, EngineError> {
        let row = sqlx::query_as::<_, BulkRunRow>(
            r#"
            SELECT id, shop, status, processed, updated, errors, total,
                cursor, last_error, created_at, finished_at
            FROM bulk_runs
            WHERE id = $1
            "#,
        )
        .bind(run_id)
        .fetch_optional(self.pool.inner())
        .await?;

        row.map(BulkRun::try_from).transpose()
    }
}

#[derive(FromRow)]
struct BulkRunRow {
    id: Uuid,
    shop: String,
    status: String,
    processed: i64,
    updated: i64,
    errors: i64,
    total: i64,
    cursor: Option<String>,
    last_error: Option<String>,
    created_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl TryFrom<BulkRunRow> for BulkRun {
    type Error = EngineError;

    fn try_from(row: BulkRunRow) -> Result<Self, Self::Error> {
        let status = RunStatus::parse(&row.status)
            .ok_or_else(|| EngineError::Store(format!("unknown run status: {}", row.status)))?;

        Ok(BulkRun {
            id: row.id,
            shop: row.shop,
            status,
            processed: row.processed,
            updated: row.updated,
            errors: row.errors,
            total: row.total,
            cursor: row.cursor,
            last_error: row.last_error,
            created_at: row.created_at,
            finished_at: row.finished_at,
        })
    }
}
