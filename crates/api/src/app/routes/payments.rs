use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use inkworks_infra::services::PaymentCommand;

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/", post(record_payment))
}

/// Allocate one customer payment across invoices; all or nothing.
pub async fn record_payment(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<PaymentCommand>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };

    match services.engine.payments.allocate(&body) {
        Ok(outcome) => (StatusCode::CREATED, Json(outcome)).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}
