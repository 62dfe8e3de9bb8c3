use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use inkworks_parties::CustomerId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(register_customer).get(list_customers))
        .route("/:id", get(get_customer).put(update_customer))
        .route("/:id/statement", get(customer_statement))
}

pub async fn register_customer(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::RegisterCustomerRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };

    match services.engine.customers.register(&body.name, body.contact) {
        Ok(c) => (StatusCode::CREATED, Json(dto::customer_to_json(&c))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateCustomerRequest>, JsonRejection>,
) -> axum::response::Response {
    let customer_id: CustomerId = match errors::parse_id(&id, "customer") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };

    match services
        .engine
        .customers
        .update(customer_id, body.name, body.contact)
    {
        Ok(c) => (StatusCode::OK, Json(dto::customer_to_json(&c))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let customer_id: CustomerId = match errors::parse_id(&id, "customer") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.engine.customers.get(customer_id) {
        Ok(c) => (StatusCode::OK, Json(dto::customer_to_json(&c))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.engine.customers.list() {
        Ok(list) => {
            let items = list.iter().map(dto::customer_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn customer_statement(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let customer_id: CustomerId = match errors::parse_id(&id, "customer") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.engine.statistics.customer_statement(customer_id) {
        Ok(statement) => (StatusCode::OK, Json(statement)).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}
