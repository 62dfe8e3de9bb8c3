use std::sync::Arc;

use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/", get(summary))
}

pub async fn summary(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.engine.statistics.summary() {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}
