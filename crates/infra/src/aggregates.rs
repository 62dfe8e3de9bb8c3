//! Storage bindings: which collection each aggregate snapshot lives in.

use inkworks_accounting::{Commission, CommissionId};
use inkworks_core::AggregateId;
use inkworks_fulfillment::{RequestId, SalesOrderRequest};
use inkworks_invoicing::{Invoice, InvoiceId};
use inkworks_parties::{Customer, CustomerId};
use inkworks_sales::{Order, OrderId};

use crate::command_dispatcher::StoredAggregate;
use crate::record_store::Collection;

macro_rules! stored_aggregate {
    ($aggregate:ty, $id:ident, $collection:expr) => {
        impl StoredAggregate for $aggregate {
            const COLLECTION: Collection = $collection;

            fn empty_with(id: AggregateId) -> Self {
                <$aggregate>::empty($id::new(id))
            }

            fn record_id(&self) -> AggregateId {
                self.id_typed().aggregate_id()
            }

            fn exists(&self) -> bool {
                self.is_created()
            }
        }
    };
}

stored_aggregate!(Customer, CustomerId, Collection::Customers);
stored_aggregate!(Order, OrderId, Collection::Orders);
stored_aggregate!(Invoice, InvoiceId, Collection::Invoices);
stored_aggregate!(Commission, CommissionId, Collection::Commissions);
stored_aggregate!(SalesOrderRequest, RequestId, Collection::Requests);
