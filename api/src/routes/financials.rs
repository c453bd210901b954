//! Financial endpoints and reports

use axum::{extract::State, routing::get, Json, Router};
use campus_common::reports::{FinancialSummary, MonthlyRevenue};
use campus_common::{
    Expense, FinancialReport, Invoice, Payment, Payroll, PlacementFee, Transition, TuitionFee,
};
use std::sync::Arc;

use super::crud;
use crate::error::{ApiResult, Params};
use crate::middleware::auth::CurrentCaller;
use crate::models::*;
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .nest(&crud::at::<TuitionFee>(), crud::resource::<TuitionFee>())
        .nest(
            &crud::at::<Payment>(),
            crud::resource::<Payment>()
                .route("/:id/mark-paid", crud::action::<Payment>(Transition::MarkPaid)),
        )
        .nest(&crud::at::<PlacementFee>(), crud::resource::<PlacementFee>())
        .nest(&crud::at::<Payroll>(), crud::resource::<Payroll>())
        .nest(&crud::at::<Expense>(), crud::resource::<Expense>())
        .nest(&crud::at::<Invoice>(), crud::resource::<Invoice>())
        .nest(&crud::at::<FinancialReport>(), crud::resource::<FinancialReport>())
        .route("/reports/summary", get(summary))
        .route("/reports/monthly-revenue", get(monthly_revenue))
}

/// Revenue, costs and overdue invoices
#[utoipa::path(
    get,
    path = "/api/financials/reports/summary",
    responses(
        (status = 200, description = "Financial summary", body = FinancialSummary),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse)
    ),
    tag = "financials",
    security(("bearer" = []))
)]
pub async fn summary(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
) -> ApiResult<Json<ApiResponse<FinancialSummary>>> {
    Ok(Json(ApiResponse::success(state.store.financial_summary(&caller)?)))
}

/// Completed payments per calendar month, oldest first
#[utoipa::path(
    get,
    path = "/api/financials/reports/monthly-revenue",
    params(("months" = Option<u32>, Query, description = "Months to cover, default 12")),
    responses(
        (status = 200, description = "Monthly revenue", body = [MonthlyRevenue]),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse)
    ),
    tag = "financials",
    security(("bearer" = []))
)]
pub async fn monthly_revenue(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
    Params(params): Params<MonthsParams>,
) -> ApiResult<Json<ApiResponse<Vec<MonthlyRevenue>>>> {
    Ok(Json(ApiResponse::success(state.store.monthly_revenue(&caller, params.months)?)))
}
