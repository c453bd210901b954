//! Dashboard statistics

use axum::{extract::State, routing::get, Json, Router};
use campus_common::reports::DashboardStats;
use std::sync::Arc;

use crate::error::ApiResult;
use crate::middleware::auth::CurrentCaller;
use crate::models::*;
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new().route("/stats", get(stats))
}

/// Headline counts over everything the caller can see
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "dashboard",
    security(("bearer" = []))
)]
pub async fn stats(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
) -> ApiResult<Json<ApiResponse<DashboardStats>>> {
    Ok(Json(ApiResponse::success(state.store.dashboard_stats(&caller)?)))
}
