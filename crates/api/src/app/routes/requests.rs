//! Fulfillment requests: intake, workflow transitions, invoice linking.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use inkworks_fulfillment::RequestId;
use inkworks_infra::services::{CreateAndLinkInput, IntakeInput};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(intake_request).get(list_requests))
        .route("/:id", get(get_request))
        .route("/:id/transition", post(transition_request))
        .route("/:id/link-invoice", post(link_invoice))
        .route("/:id/create-invoice", post(create_invoice))
        .route("/:id/payment-decision", post(decide_payment))
}

fn request_id(raw: &str) -> Result<RequestId, axum::response::Response> {
    errors::parse_id(raw, "request")
}

pub async fn intake_request(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<IntakeInput>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };

    match services.engine.fulfillment.intake(&body) {
        Ok(r) => (StatusCode::CREATED, Json(dto::request_to_json(&r))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn get_request(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let request_id = match request_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.engine.fulfillment.get(request_id) {
        Ok(r) => (StatusCode::OK, Json(dto::request_to_json(&r))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn list_requests(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.engine.fulfillment.list() {
        Ok(list) => {
            let items = list.iter().map(dto::request_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(json!({ "items": items }))).into_response()
        }
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn transition_request(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::TransitionRequestBody>, JsonRejection>,
) -> axum::response::Response {
    let request_id = match request_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };

    match services.engine.fulfillment.transition(
        request_id,
        body.target_status,
        body.assignee,
        body.actor_id,
    ) {
        Ok(r) => {
            let mut out = dto::request_to_json(&r);
            out["new_status"] = json!(r.status());
            (StatusCode::OK, Json(out)).into_response()
        }
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn link_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::LinkInvoiceRequest>, JsonRejection>,
) -> axum::response::Response {
    let request_id = match request_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };

    match services.engine.fulfillment.link_invoice(request_id, body.invoice_id) {
        Ok(r) => (StatusCode::OK, Json(dto::request_to_json(&r))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn create_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<CreateAndLinkInput>, JsonRejection>,
) -> axum::response::Response {
    let request_id = match request_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };

    match services
        .engine
        .fulfillment
        .create_invoice_and_link(request_id, &body)
    {
        Ok((r, i)) => (
            StatusCode::CREATED,
            Json(json!({
                "request": dto::request_to_json(&r),
                "invoice": dto::invoice_to_json(&i),
            })),
        )
            .into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn decide_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::PaymentDecisionRequest>, JsonRejection>,
) -> axum::response::Response {
    let request_id = match request_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };

    match services
        .engine
        .fulfillment
        .decide_payment(request_id, body.decision, body.actor_id)
    {
        Ok(r) => (StatusCode::OK, Json(dto::request_to_json(&r))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}
