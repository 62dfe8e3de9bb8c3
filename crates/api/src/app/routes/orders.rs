use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use inkworks_sales::OrderId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_order))
        .route("/:id", get(get_order))
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateOrderRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };

    match services
        .engine
        .orders
        .create(body.customer_id, &body.description, body.total_amount)
    {
        Ok(o) => (StatusCode::CREATED, Json(dto::order_to_json(&o))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.engine.orders.get(order_id) {
        Ok(o) => (StatusCode::OK, Json(dto::order_to_json(&o))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}
