//! Postgres-backed record store.
//!
//! All collections share one `records` table keyed by `(collection, id)` with
//! a JSONB payload. A batch is committed inside a single transaction, and
//! every update or delete carries `WHERE version = $expected`, so a stale write
//! affects zero rows and aborts the transaction.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Concurrency` (insert raced another insert) |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / other | N/A | `Backend` |

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::{Span, instrument};
use uuid::Uuid;

use inkworks_core::AggregateId;

use super::r#trait::{Collection, RecordStore, StoreError, StoredRecord, WriteBatch, WriteOp};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    collection  TEXT        NOT NULL,
    id          UUID        NOT NULL,
    version     BIGINT      NOT NULL CHECK (version > 0),
    payload     JSONB       NOT NULL,
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (collection, id)
)
"#;

#[derive(Debug, Clone)]
pub struct PostgresRecordStore {
    pool: Arc<PgPool>,
}

impl PostgresRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the `records` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(collection = %collection, id = %id), err)]
    pub async fn fetch(
        &self,
        collection: Collection,
        id: AggregateId,
    ) -> Result<Option<StoredRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, version, payload, updated_at
            FROM records
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection.as_str())
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch", e))?;

        row.map(|r| record_from_row(collection, &r)).transpose()
    }

    #[instrument(
        skip(self),
        fields(collection = %collection, record_count = tracing::field::Empty),
        err
    )]
    pub async fn fetch_all(&self, collection: Collection) -> Result<Vec<StoredRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, version, payload, updated_at
            FROM records
            WHERE collection = $1
            ORDER BY id ASC
            "#,
        )
        .bind(collection.as_str())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_all", e))?;

        let span = Span::current();
        span.record("record_count", rows.len());

        rows.iter().map(|r| record_from_row(collection, r)).collect()
    }

    /// Apply a batch in one transaction.
    ///
    /// Dropping the transaction on an early return rolls it back.
    #[instrument(skip(self, batch), fields(op_count = batch.len()), err)]
    pub async fn commit_batch(&self, batch: WriteBatch) -> Result<Vec<StoredRecord>, StoreError> {
        if batch.is_empty() {
            return Ok(vec![]);
        }
        batch.validate_keys()?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let now = Utc::now();
        let mut written = Vec::with_capacity(batch.len());

        for (idx, op) in batch.into_ops().into_iter().enumerate() {
            match op {
                WriteOp::Insert {
                    collection,
                    id,
                    version,
                    payload,
                } => {
                    sqlx::query(
                        r#"
                        INSERT INTO records (collection, id, version, payload, updated_at)
                        VALUES ($1, $2, $3, $4, $5)
                        "#,
                    )
                    .bind(collection.as_str())
                    .bind(id.as_uuid())
                    .bind(version as i64)
                    .bind(&payload)
                    .bind(now)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| {
                        if is_unique_violation(&e) {
                            StoreError::Concurrency(format!(
                                "{collection}/{id} (index {idx}) already exists"
                            ))
                        } else {
                            map_sqlx_error("insert_record", e)
                        }
                    })?;

                    written.push(StoredRecord {
                        collection,
                        id,
                        version,
                        payload,
                        updated_at: now,
                    });
                }
                WriteOp::Update {
                    collection,
                    id,
                    expected,
                    version,
                    payload,
                } => {
                    let result = sqlx::query(
                        r#"
                        UPDATE records
                        SET version = $4, payload = $5, updated_at = $6
                        WHERE collection = $1 AND id = $2 AND version = $3
                        "#,
                    )
                    .bind(collection.as_str())
                    .bind(id.as_uuid())
                    .bind(expected as i64)
                    .bind(version as i64)
                    .bind(&payload)
                    .bind(now)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| map_sqlx_error("update_record", e))?;

                    if result.rows_affected() != 1 {
                        return Err(StoreError::Concurrency(format!(
                            "{collection}/{id} (index {idx}) is no longer at version {expected}"
                        )));
                    }

                    written.push(StoredRecord {
                        collection,
                        id,
                        version,
                        payload,
                        updated_at: now,
                    });
                }
                WriteOp::Delete {
                    collection,
                    id,
                    expected,
                } => {
                    let result = sqlx::query(
                        r#"
                        DELETE FROM records
                        WHERE collection = $1 AND id = $2 AND version = $3
                        "#,
                    )
                    .bind(collection.as_str())
                    .bind(id.as_uuid())
                    .bind(expected as i64)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| map_sqlx_error("delete_record", e))?;

                    if result.rows_affected() != 1 {
                        return Err(StoreError::Concurrency(format!(
                            "{collection}/{id} (index {idx}) is no longer at version {expected}"
                        )));
                    }
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(written)
    }
}

/// `RecordStore` is synchronous; bridge onto the ambient tokio runtime.
///
/// Requires a multi-threaded runtime (`block_in_place`).
fn block_on<F, T>(fut: F) -> Result<T, StoreError>
where
    F: std::future::Future<Output = Result<T, StoreError>>,
{
    let handle = tokio::runtime::Handle::try_current().map_err(|_| {
        StoreError::Backend("PostgresRecordStore requires a tokio runtime".to_string())
    })?;
    tokio::task::block_in_place(|| handle.block_on(fut))
}

impl RecordStore for PostgresRecordStore {
    fn get(&self, collection: Collection, id: AggregateId) -> Result<Option<StoredRecord>, StoreError> {
        block_on(self.fetch(collection, id))
    }

    fn list(&self, collection: Collection) -> Result<Vec<StoredRecord>, StoreError> {
        block_on(self.fetch_all(collection))
    }

    fn commit(&self, batch: WriteBatch) -> Result<Vec<StoredRecord>, StoreError> {
        block_on(self.commit_batch(batch))
    }
}

fn record_from_row(collection: Collection, row: &sqlx::postgres::PgRow) -> Result<StoredRecord, StoreError> {
    let decode = |e: sqlx::Error| StoreError::Serialization(format!("failed to decode record row: {e}"));

    let id: Uuid = row.try_get("id").map_err(decode)?;
    let version: i64 = row.try_get("version").map_err(decode)?;
    let payload: JsonValue = row.try_get("payload").map_err(decode)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(decode)?;

    let version = u64::try_from(version)
        .map_err(|_| StoreError::Serialization(format!("negative version {version}")))?;

    Ok(StoredRecord {
        collection,
        id: AggregateId::from_uuid(id),
        version,
        payload,
        updated_at,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Concurrency(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505")
    )
}
