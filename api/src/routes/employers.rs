//! Employer endpoints: profiles, job postings, applications, rehires,
//! feedback

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use campus_common::{
    ApplyInput, EmployerFeedback, EmployerProfile, Filter, JobApplication, JobPosting, Placement,
    RehireRequest, Transition,
};
use std::sync::Arc;
use uuid::Uuid;

use super::crud;
use crate::error::{ApiResult, OptionalBody, PathId};
use crate::middleware::auth::CurrentCaller;
use crate::models::*;
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .nest(
            &crud::at::<EmployerProfile>(),
            crud::resource::<EmployerProfile>()
                .route(
                    "/:id/job-postings",
                    crud::children::<EmployerProfile, JobPosting>(Filter::employer),
                )
                .route("/:id/placements", crud::children::<EmployerProfile, Placement>(Filter::employer))
                .route("/:id/feedback", crud::children::<EmployerProfile, EmployerFeedback>(Filter::employer)),
        )
        .nest(
            &crud::at::<JobPosting>(),
            crud::resource::<JobPosting>()
                .route("/:id/apply", post(apply))
                .route(
                    "/:id/applications",
                    crud::children::<JobPosting, JobApplication>(Filter::posting),
                ),
        )
        .nest(
            &crud::at::<JobApplication>(),
            crud::resource::<JobApplication>()
                .route("/:id/approve", crud::action::<JobApplication>(Transition::Approve))
                .route("/:id/reject", crud::action::<JobApplication>(Transition::Reject)),
        )
        .nest(
            &crud::at::<RehireRequest>(),
            crud::resource::<RehireRequest>()
                .route("/:id/approve", crud::action::<RehireRequest>(Transition::Approve))
                .route("/:id/reject", crud::action::<RehireRequest>(Transition::Reject)),
        )
        .nest(&crud::at::<EmployerFeedback>(), crud::resource::<EmployerFeedback>())
}

/// Student applies to an active posting; the body may be empty but not
/// malformed
pub async fn apply(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
    PathId(id): PathId<Uuid>,
    OptionalBody(input): OptionalBody<ApplyInput>,
) -> ApiResult<(StatusCode, Json<ApiResponse<JobApplication>>)> {
    let input = input.unwrap_or_default();
    let application = state.store.apply(&caller, id, input)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(application))))
}
