use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use inkworks_accounting::CommissionId;
use inkworks_infra::services::AccrualInput;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(accrue_commission).get(list_commissions))
        .route("/totals", get(commission_totals))
        .route("/:id", get(get_commission))
        .route("/:id/settle", post(settle_commission))
}

pub async fn accrue_commission(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<AccrualInput>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };

    match services.engine.commissions.accrue(&body) {
        Ok(c) => (StatusCode::CREATED, Json(dto::commission_to_json(&c))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn settle_commission(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::SettleCommissionRequest>, JsonRejection>,
) -> axum::response::Response {
    let commission_id: CommissionId = match errors::parse_id(&id, "commission") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };

    match services.engine.commissions.settle(commission_id, body.actor_id) {
        Ok(c) => (StatusCode::OK, Json(dto::commission_to_json(&c))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn get_commission(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let commission_id: CommissionId = match errors::parse_id(&id, "commission") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.engine.commissions.get(commission_id) {
        Ok(c) => (StatusCode::OK, Json(dto::commission_to_json(&c))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn list_commissions(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.engine.commissions.list() {
        Ok(list) => {
            let items = list.iter().map(dto::commission_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn commission_totals(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::CommissionTotalsQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::query_rejection(e),
    };

    match services.engine.commissions.totals(query.user_id) {
        Ok(totals) => (StatusCode::OK, Json(totals)).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}
