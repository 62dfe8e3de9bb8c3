//! Infrastructure layer: record storage, the command pipeline and the
//! application services built on it.

pub mod aggregates;
pub mod catalog;
pub mod command_dispatcher;
pub mod config;
pub mod record_store;
pub mod services;


pub use catalog::InMemoryStockCatalog;
pub use command_dispatcher::{CommandDispatcher, DispatchError, StoredAggregate, Tracked, UnitOfWork};
pub use config::EngineConfig;
pub use record_store::{
    Collection, InMemoryRecordStore, PostgresRecordStore, RecordStore, StoreError, StoredRecord,
    WriteBatch, WriteOp,
};
pub use services::Engine;
