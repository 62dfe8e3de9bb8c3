//! Versioned record storage boundary.
//!
//! Every aggregate is persisted as its latest JSON snapshot together with the
//! number of events applied to it. That count is the optimistic concurrency
//! token: writes name the version they were computed from.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryRecordStore;
pub use postgres::PostgresRecordStore;
pub use r#trait::{Collection, RecordStore, StoreError, StoredRecord, WriteBatch, WriteOp};
