use axum::Router;

pub mod catalog;
pub mod commissions;
pub mod customers;
pub mod invoices;
pub mod orders;
pub mod payments;
pub mod requests;
pub mod statistics;
pub mod system;

/// Router for every engine endpoint.
pub fn router() -> Router {
    Router::new()
        .nest("/customers", customers::router())
        .nest("/orders", orders::router())
        .nest("/invoices", invoices::router())
        .nest("/payments", payments::router())
        .nest("/commissions", commissions::router())
        .nest("/requests", requests::router())
        .nest("/statistics", statistics::router())
        .nest("/catalog", catalog::router())
}
