//! HTTP API application wiring (Axum router + engine wiring).
//!
//! - `services.rs`: record store backend, event bus and stock catalog
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::config::AppConfig;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::{AppServices, BootstrapError};

/// Build the full HTTP router from configuration (entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> Result<Router, BootstrapError> {
    let services = services::build_services(&config.storage, config.engine.clone()).await?;
    Ok(router_with(Arc::new(services)))
}

/// Router over already-built services.
pub fn router_with(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
