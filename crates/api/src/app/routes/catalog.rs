use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::put,
    Json, Router,
};
use serde_json::json;

use inkworks_inventory::ProductId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/:product_id", put(set_stock_level))
}

/// Dev helper: seed the stock level consulted at activation.
pub async fn set_stock_level(
    Extension(services): Extension<Arc<AppServices>>,
    Path(product_id): Path<String>,
    body: Result<Json<dto::SetStockRequest>, JsonRejection>,
) -> axum::response::Response {
    let product_id = match ProductId::new(product_id) {
        Ok(v) => v,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()),
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };

    services.catalog.set_level(product_id.clone(), body.stock_quantity);
    tracing::info!(product_id = %product_id, stock_quantity = body.stock_quantity, "stock level set");

    (
        StatusCode::OK,
        Json(json!({
            "product_id": product_id.to_string(),
            "stock_quantity": body.stock_quantity,
        })),
    )
        .into_response()
}
