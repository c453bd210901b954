//! Certification endpoints

use axum::{extract::State, routing::get, Json, Router};
use campus_common::{CampusError, Certificate, CertificateVerification, CompetencyAssessment};
use std::sync::Arc;

use super::crud;
use crate::error::{ApiResult, Params};
use crate::models::*;
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .nest(
            &crud::at::<Certificate>(),
            crud::resource::<Certificate>().route("/verify", get(verify)),
        )
        .nest(&crud::at::<CompetencyAssessment>(), crud::resource::<CompetencyAssessment>())
}

/// Public certificate lookup by verification code
#[utoipa::path(
    get,
    path = "/api/certifications/certificates/verify",
    params(("code" = String, Query, description = "Verification code printed on the certificate")),
    responses(
        (status = 200, description = "Certificate found", body = CertificateVerification),
        (status = 400, description = "No code given", body = ErrorResponse),
        (status = 404, description = "Unknown code", body = ErrorResponse)
    ),
    tag = "certifications"
)]
pub async fn verify(
    State(state): State<Arc<ApiState>>,
    Params(params): Params<VerifyParams>,
) -> ApiResult<Json<ApiResponse<CertificateVerification>>> {
    let code = params
        .code
        .ok_or_else(|| CampusError::invalid("code", "a verification code is required"))?;
    Ok(Json(ApiResponse::success(state.store.verify_certificate(&code)?)))
}
