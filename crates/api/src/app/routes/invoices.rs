use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use inkworks_infra::services::DraftInvoiceInput;
use inkworks_invoicing::InvoiceId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_draft).get(list_invoices))
        .route("/:id", get(get_invoice))
        .route("/:id/activate", post(activate_invoice))
        .route("/:id/items", put(replace_items))
        .route("/:id/profit", get(invoice_profit))
        .route("/:id/payments", get(invoice_payments))
}

fn invoice_id(raw: &str) -> Result<InvoiceId, axum::response::Response> {
    errors::parse_id(raw, "invoice")
}

pub async fn create_draft(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<DraftInvoiceInput>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };

    match services.engine.invoices.create_draft(&body) {
        Ok(i) => (StatusCode::CREATED, Json(dto::invoice_to_json(&i))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn activate_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::ActivateInvoiceRequest>, JsonRejection>,
) -> axum::response::Response {
    let invoice_id = match invoice_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };

    match services.engine.invoices.activate(invoice_id, &body.number) {
        Ok(i) => (StatusCode::OK, Json(dto::invoice_to_json(&i))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn replace_items(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::ReplaceItemsRequest>, JsonRejection>,
) -> axum::response::Response {
    let invoice_id = match invoice_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };

    match services
        .engine
        .invoices
        .replace_items(invoice_id, &body.items, body.tax_amount)
    {
        Ok(i) => (StatusCode::OK, Json(dto::invoice_to_json(&i))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn get_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let invoice_id = match invoice_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.engine.invoices.get(invoice_id) {
        Ok(i) => (StatusCode::OK, Json(dto::invoice_to_json(&i))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn list_invoices(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.engine.invoices.list() {
        Ok(list) => {
            let items = list.iter().map(dto::invoice_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn invoice_profit(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let invoice_id = match invoice_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.engine.statistics.invoice_profit(invoice_id) {
        Ok(profit) => (StatusCode::OK, Json(profit)).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn invoice_payments(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let invoice_id = match invoice_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.engine.statistics.payments_for(invoice_id) {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}
