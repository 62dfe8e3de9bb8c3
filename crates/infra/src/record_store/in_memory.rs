use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;

use inkworks_core::AggregateId;

use super::r#trait::{Collection, RecordStore, StoreError, StoredRecord, WriteBatch, WriteOp};

type Key = (Collection, AggregateId);

/// In-memory record store.
///
/// Intended for tests/dev. A batch is checked in full under the write lock
/// before anything is applied.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<Key, StoredRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn get(&self, collection: Collection, id: AggregateId) -> Result<Option<StoredRecord>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        Ok(records.get(&(collection, id)).cloned())
    }

    fn list(&self, collection: Collection) -> Result<Vec<StoredRecord>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        let mut out: Vec<StoredRecord> = records
            .values()
            .filter(|r| r.collection == collection)
            .cloned()
            .collect();
        // UUIDv7 keys sort by creation time.
        out.sort_by_key(|r| r.id);
        Ok(out)
    }

    fn commit(&self, batch: WriteBatch) -> Result<Vec<StoredRecord>, StoreError> {
        if batch.is_empty() {
            return Ok(vec![]);
        }
        batch.validate_keys()?;

        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        // 1) Check every op against current versions.
        for (idx, op) in batch.ops().iter().enumerate() {
            let key = op.key();
            let current = records.get(&key).map(|r| r.version);
            let expected = op.expected_version();
            if !expected.matches(current) {
                return Err(StoreError::Concurrency(format!(
                    "{}/{} (index {idx}): expected {expected:?}, found {current:?}",
                    key.0, key.1
                )));
            }
        }

        // 2) Apply.
        let now = Utc::now();
        let mut written = Vec::with_capacity(batch.len());
        for op in batch.into_ops() {
            match op {
                WriteOp::Insert {
                    collection,
                    id,
                    version,
                    payload,
                }
                | WriteOp::Update {
                    collection,
                    id,
                    version,
                    payload,
                    ..
                } => {
                    let record = StoredRecord {
                        collection,
                        id,
                        version,
                        payload,
                        updated_at: now,
                    };
                    records.insert((collection, id), record.clone());
                    written.push(record);
                }
                WriteOp::Delete { collection, id, .. } => {
                    records.remove(&(collection, id));
                }
            }
        }

        Ok(written)
    }
}
