use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use inkworks_core::{AggregateId, ExpectedVersion};
use std::sync::Arc;

/// Logical table a record lives in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Customers,
    Orders,
    Invoices,
    Payments,
    Commissions,
    Requests,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Customers => "customers",
            Collection::Orders => "orders",
            Collection::Invoices => "invoices",
            Collection::Payments => "payments",
            Collection::Commissions => "commissions",
            Collection::Requests => "requests",
        }
    }

    /// Aggregate type stamped on change notifications for this collection.
    pub fn aggregate_type(&self) -> &'static str {
        match self {
            Collection::Customers => "parties.customer",
            Collection::Orders => "sales.order",
            Collection::Invoices => "invoicing.invoice",
            Collection::Payments => "invoicing.payment",
            Collection::Commissions => "accounting.commission",
            Collection::Requests => "fulfillment.request",
        }
    }
}

impl core::fmt::Display for Collection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted record: the latest snapshot of one aggregate (or one payment row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub collection: Collection,
    pub id: AggregateId,
    /// Number of applied events; the optimistic concurrency token.
    pub version: u64,
    pub payload: JsonValue,
    pub updated_at: DateTime<Utc>,
}

/// One mutation inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Create a record; fails if one already exists under the key.
    Insert {
        collection: Collection,
        id: AggregateId,
        version: u64,
        payload: JsonValue,
    },
    /// Replace a record that must still be at `expected`.
    Update {
        collection: Collection,
        id: AggregateId,
        expected: u64,
        version: u64,
        payload: JsonValue,
    },
    /// Remove a record that must still be at `expected`.
    Delete {
        collection: Collection,
        id: AggregateId,
        expected: u64,
    },
}

impl WriteOp {
    pub fn key(&self) -> (Collection, AggregateId) {
        match self {
            WriteOp::Insert { collection, id, .. }
            | WriteOp::Update { collection, id, .. }
            | WriteOp::Delete { collection, id, .. } => (*collection, *id),
        }
    }

    pub fn expected_version(&self) -> ExpectedVersion {
        match self {
            WriteOp::Insert { .. } => ExpectedVersion::Absent,
            WriteOp::Update { expected, .. } | WriteOp::Delete { expected, .. } => {
                ExpectedVersion::Exact(*expected)
            }
        }
    }
}

/// Mutations committed together or not at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Each key may appear at most once per batch.
    pub fn validate_keys(&self) -> Result<(), StoreError> {
        let mut seen = std::collections::HashSet::with_capacity(self.ops.len());
        for (idx, op) in self.ops.iter().enumerate() {
            let (collection, id) = op.key();
            if !seen.insert((collection, id)) {
                return Err(StoreError::InvalidBatch(format!(
                    "{collection}/{id} written twice (index {idx})"
                )));
            }
        }
        Ok(())
    }
}

/// Record store operation error.
///
/// Infrastructure failures only; domain rules never surface here.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write named a version that is no longer current.
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("invalid batch: {0}")]
    InvalidBatch(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Versioned record storage with atomic multi-record commits.
///
/// `commit` applies every op of a batch or none of them. Implementations must
/// check every op's expected version before applying anything.
pub trait RecordStore: Send + Sync {
    fn get(&self, collection: Collection, id: AggregateId) -> Result<Option<StoredRecord>, StoreError>;

    fn list(&self, collection: Collection) -> Result<Vec<StoredRecord>, StoreError>;

    /// Returns the records as written (deletes are omitted).
    fn commit(&self, batch: WriteBatch) -> Result<Vec<StoredRecord>, StoreError>;
}

impl<S> RecordStore for Arc<S>
where
    S: RecordStore + ?Sized,
{
    fn get(&self, collection: Collection, id: AggregateId) -> Result<Option<StoredRecord>, StoreError> {
        (**self).get(collection, id)
    }

    fn list(&self, collection: Collection) -> Result<Vec<StoredRecord>, StoreError> {
        (**self).list(collection)
    }

    fn commit(&self, batch: WriteBatch) -> Result<Vec<StoredRecord>, StoreError> {
        (**self).commit(batch)
    }
}
