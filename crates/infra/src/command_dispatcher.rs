//! Command execution pipeline (application-level orchestration).
//!
//! ```text
//! Command
//!   ↓
//! 1. Load snapshots from the record store (remember the version read)
//!   ↓
//! 2. Handle commands (pure decision logic, produces events)
//!   ↓
//! 3. Apply events to the in-memory snapshots
//!   ↓
//! 4. Commit every touched record as one write batch (optimistic, all-or-nothing)
//!   ↓
//! 5. Publish one envelope per event (only after the commit succeeded)
//! ```
//!
//! A [`UnitOfWork`] collects steps 2–3 for any number of records so a
//! multi-record operation (a payment spread over several invoices, an invoice
//! created and linked to a request) lands in a single batch.
//!
//! This module contains no IO itself; it composes the store and bus traits.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use inkworks_core::{Aggregate, AggregateId, AggregateRoot, DomainError};
use inkworks_events::{Event, EventBus, EventEnvelope};
use inkworks_invoicing::InvoiceId;

use crate::record_store::{Collection, RecordStore, StoreError, StoredRecord, WriteBatch, WriteOp};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// A domain rule refused the command; nothing was written.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// One allocation of a multi-invoice payment was invalid; nothing was written.
    #[error("allocation {index} (invoice {invoice_id}) rejected: {source}")]
    Rejected {
        index: usize,
        invoice_id: InvoiceId,
        #[source]
        source: DomainError,
    },

    /// Optimistic concurrency failure that survived every retry.
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    /// The store failed; nothing was written.
    #[error(transparent)]
    Store(StoreError),

    /// A stored payload no longer matches its type.
    #[error("failed to decode stored record: {0}")]
    Deserialize(String),

    /// The batch committed but a notification could not be published.
    #[error("publication failed after commit: {0}")]
    Publish(String),
}

impl From<StoreError> for DispatchError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Concurrency(msg) => DispatchError::Concurrency(msg),
            other => DispatchError::Store(other),
        }
    }
}

impl DispatchError {
    /// The domain error behind this failure, if any.
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            DispatchError::Domain(e) => Some(e),
            DispatchError::Rejected { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn is_concurrency(&self) -> bool {
        matches!(self, DispatchError::Concurrency(_))
    }
}

/// An aggregate that is persisted as a snapshot in one collection.
pub trait StoredAggregate:
    Aggregate<Error = DomainError, Event: Event + Serialize> + Serialize + DeserializeOwned + Clone
{
    const COLLECTION: Collection;

    /// A not-yet-created instance keyed by `id`.
    fn empty_with(id: AggregateId) -> Self;

    fn record_id(&self) -> AggregateId;

    fn exists(&self) -> bool;
}

/// A snapshot plus the store version it was read at (`None` = not stored yet).
#[derive(Debug, Clone)]
pub struct Tracked<A> {
    aggregate: A,
    read_version: Option<u64>,
}

impl<A> Tracked<A> {
    pub fn new(aggregate: A) -> Self {
        Self {
            aggregate,
            read_version: None,
        }
    }

    pub fn read_version(&self) -> Option<u64> {
        self.read_version
    }

    pub fn into_inner(self) -> A {
        self.aggregate
    }
}

impl<A> core::ops::Deref for Tracked<A> {
    type Target = A;

    fn deref(&self) -> &A {
        &self.aggregate
    }
}

/// Decided-but-uncommitted changes across any number of records.
#[derive(Debug, Default)]
pub struct UnitOfWork {
    batch: WriteBatch,
    envelopes: Vec<EventEnvelope<JsonValue>>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide `command` against `target` and apply the resulting events in memory.
    ///
    /// Nothing is staged for writing until [`UnitOfWork::stage`].
    pub fn execute<A>(
        &mut self,
        target: &mut Tracked<A>,
        command: &A::Command,
    ) -> Result<Vec<A::Event>, DispatchError>
    where
        A: StoredAggregate,
    {
        let decided = target.aggregate.handle(command)?;

        for event in &decided {
            target.aggregate.apply(event);
            let payload = serde_json::to_value(event)
                .map_err(|e| StoreError::Serialization(format!("event payload: {e}")))?;
            self.envelopes.push(EventEnvelope::new(
                Uuid::now_v7(),
                target.aggregate.record_id(),
                A::COLLECTION.aggregate_type(),
                event.event_type(),
                target.aggregate.version(),
                event.occurred_at(),
                payload,
            ));
        }

        Ok(decided)
    }

    /// Queue the snapshot for writing if it changed since it was read.
    pub fn stage<A>(&mut self, target: &Tracked<A>) -> Result<(), DispatchError>
    where
        A: StoredAggregate,
    {
        let version = target.aggregate.version();
        if target.read_version == Some(version) {
            return Ok(());
        }

        let payload = serde_json::to_value(&target.aggregate)
            .map_err(|e| StoreError::Serialization(format!("{} snapshot: {e}", A::COLLECTION)))?;
        let id = target.aggregate.record_id();

        self.batch.push(match target.read_version {
            None => WriteOp::Insert {
                collection: A::COLLECTION,
                id,
                version,
                payload,
            },
            Some(expected) => WriteOp::Update {
                collection: A::COLLECTION,
                id,
                expected,
                version,
                payload,
            },
        });
        Ok(())
    }

    /// Queue an immutable row (e.g. a payment) for insertion.
    pub fn insert_row<T: Serialize>(
        &mut self,
        collection: Collection,
        id: AggregateId,
        row: &T,
    ) -> Result<(), DispatchError> {
        let payload = serde_json::to_value(row)
            .map_err(|e| StoreError::Serialization(format!("{collection} row: {e}")))?;
        self.batch.push(WriteOp::Insert {
            collection,
            id,
            version: 1,
            payload,
        });
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    pub fn op_count(&self) -> usize {
        self.batch.len()
    }
}

/// Reusable command execution engine over a record store and a bus.
///
/// - **Atomicity**: one batch per unit of work; if the commit fails nothing is published.
/// - **Concurrency**: every update names the version it was read at.
/// - **At-least-once**: a publish failure after commit is reported as
///   [`DispatchError::Publish`]; the state is already durable.
#[derive(Debug)]
pub struct CommandDispatcher<S, B> {
    store: S,
    bus: B,
}

impl<S, B> CommandDispatcher<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self { store, bus }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn into_parts(self) -> (S, B) {
        (self.store, self.bus)
    }
}

impl<S, B> CommandDispatcher<S, B>
where
    S: RecordStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Load a snapshot, or `None` if nothing is stored under `id`.
    pub fn load<A>(&self, id: AggregateId) -> Result<Option<Tracked<A>>, DispatchError>
    where
        A: StoredAggregate,
    {
        let Some(record) = self.store.get(A::COLLECTION, id)? else {
            return Ok(None);
        };

        let aggregate: A = decode(&record)?;
        Ok(Some(Tracked {
            aggregate,
            read_version: Some(record.version),
        }))
    }

    /// Load a snapshot that must exist.
    pub fn load_existing<A>(&self, id: AggregateId) -> Result<Tracked<A>, DispatchError>
    where
        A: StoredAggregate,
    {
        self.load(id)?
            .filter(|t: &Tracked<A>| t.exists())
            .ok_or(DispatchError::Domain(DomainError::not_found()))
    }

    /// A stored snapshot, or an empty instance ready to be created.
    pub fn load_or_empty<A>(&self, id: AggregateId) -> Result<Tracked<A>, DispatchError>
    where
        A: StoredAggregate,
    {
        Ok(self
            .load(id)?
            .unwrap_or_else(|| Tracked::new(A::empty_with(id))))
    }

    /// Every snapshot in the aggregate's collection, freshly read.
    pub fn list<A>(&self) -> Result<Vec<A>, DispatchError>
    where
        A: StoredAggregate,
    {
        self.list_rows(A::COLLECTION)
    }

    /// Like [`CommandDispatcher::list`], keeping read versions for a later write.
    pub fn list_tracked<A>(&self) -> Result<Vec<Tracked<A>>, DispatchError>
    where
        A: StoredAggregate,
    {
        self.store
            .list(A::COLLECTION)?
            .iter()
            .map(|record| {
                Ok(Tracked {
                    aggregate: decode(record)?,
                    read_version: Some(record.version),
                })
            })
            .collect()
    }

    pub fn list_rows<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>, DispatchError> {
        self.store
            .list(collection)?
            .iter()
            .map(decode)
            .collect()
    }

    /// Commit a unit of work as one batch, then publish its events.
    pub fn commit(&self, work: UnitOfWork) -> Result<Vec<StoredRecord>, DispatchError> {
        if work.is_empty() {
            return Ok(vec![]);
        }

        let UnitOfWork { batch, envelopes } = work;
        let op_count = batch.len();

        let written = self.store.commit(batch).map_err(|e| {
            warn!(error = %e, op_count, "write batch rejected");
            DispatchError::from(e)
        })?;
        debug!(op_count, "write batch committed");

        for envelope in envelopes {
            let event_type = envelope.event_type().to_string();
            self.bus.publish(envelope).map_err(|e| {
                warn!(event_type = %event_type, "publication failed after commit");
                DispatchError::Publish(format!("{e:?}"))
            })?;
        }

        Ok(written)
    }

    /// Single-record convenience: load (or start empty), execute, commit.
    ///
    /// Returns the updated snapshot.
    pub fn dispatch<A>(&self, id: AggregateId, command: &A::Command) -> Result<A, DispatchError>
    where
        A: StoredAggregate,
    {
        let mut target = self.load_or_empty::<A>(id)?;
        let mut work = UnitOfWork::new();
        work.execute(&mut target, command)?;
        work.stage(&target)?;
        self.commit(work)?;

        let collection = A::COLLECTION;
        info!(
            collection = %collection,
            id = %id,
            version = target.version(),
            "command applied"
        );
        Ok(target.into_inner())
    }
}

/// Re-run `op` while it fails on optimistic concurrency, at most `retries` extra times.
///
/// Each run must re-read its inputs so preconditions are re-checked against
/// the freshest state.
pub fn retry_on_conflict<T>(
    retries: u32,
    mut op: impl FnMut() -> Result<T, DispatchError>,
) -> Result<T, DispatchError> {
    let mut attempt = 0;
    loop {
        match op() {
            Err(e) if e.is_concurrency() && attempt < retries => {
                attempt += 1;
                debug!(attempt, error = %e, "retrying after version conflict");
            }
            other => return other,
        }
    }
}

fn decode<T: DeserializeOwned>(record: &StoredRecord) -> Result<T, DispatchError> {
    serde_json::from_value(record.payload.clone()).map_err(|e| {
        DispatchError::Deserialize(format!("{}/{}: {e}", record.collection, record.id))
    })
}
