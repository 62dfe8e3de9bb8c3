use std::str::FromStr;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::{Map, Value as JsonValue, json};

use inkworks_core::DomainError;
use inkworks_infra::DispatchError;
use inkworks_invoicing::InvoiceId;

pub fn dispatch_error_to_response(err: DispatchError) -> axum::response::Response {
    match err {
        DispatchError::Domain(e) => domain_error_to_response(e, None),
        DispatchError::Rejected {
            index,
            invoice_id,
            source,
        } => domain_error_to_response(source, Some((index, invoice_id))),
        DispatchError::Concurrency(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DispatchError::Store(e) => {
            tracing::error!(error = %e, "record store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
        DispatchError::Deserialize(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "deserialize_error", msg)
        }
        DispatchError::Publish(msg) => json_error(StatusCode::BAD_GATEWAY, "publish_error", msg),
    }
}

/// Map a domain error, optionally naming the allocation it was raised for.
fn domain_error_to_response(
    err: DomainError,
    allocation: Option<(usize, InvoiceId)>,
) -> axum::response::Response {
    let message = err.to_string();
    let mut extra = Map::new();
    if let Some((index, invoice_id)) = allocation {
        extra.insert("allocation_index".into(), json!(index));
        extra.insert("invoice_id".into(), json!(invoice_id.to_string()));
    }

    let (status, code) = match err {
        DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        DomainError::InvalidId(_) => (StatusCode::BAD_REQUEST, "invalid_id"),
        DomainError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
        DomainError::PreconditionFailed(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "precondition_failed")
        }
        DomainError::InsufficientStock {
            product_id,
            requested,
            available,
        } => {
            extra.insert("product_id".into(), json!(product_id));
            extra.insert("requested".into(), json!(requested));
            extra.insert("available".into(), json!(available));
            (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_stock")
        }
        DomainError::InvoiceRequired { target_status } => {
            extra.insert("target_status".into(), json!(target_status));
            (StatusCode::UNPROCESSABLE_ENTITY, "invoice_required")
        }
        DomainError::InvalidTransition { from, to } => {
            extra.insert("from".into(), json!(from));
            extra.insert("to".into(), json!(to));
            (StatusCode::UNPROCESSABLE_ENTITY, "invalid_transition")
        }
        DomainError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
    };

    json_error_with(status, code, message, extra)
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    json_error_with(status, code, message, Map::new())
}

fn json_error_with(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
    extra: Map<String, JsonValue>,
) -> axum::response::Response {
    let mut body = Map::new();
    body.insert("error".into(), json!(code));
    body.insert("message".into(), json!(message.into()));
    body.extend(extra);
    (status, axum::Json(JsonValue::Object(body))).into_response()
}

pub fn json_rejection(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
}

pub fn query_rejection(rejection: QueryRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_query", rejection.body_text())
}

/// Parse a typed id from a path segment.
pub fn parse_id<T: FromStr>(raw: &str, what: &'static str) -> Result<T, axum::response::Response> {
    raw.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id")))
}
