//! Student endpoints: profiles, enrollments, attendance, results, progress
//! reports, placements

use axum::{extract::State, routing::get, Json, Router};
use campus_common::reports::{AttendanceMonth, StudentProgress};
use campus_common::{
    AssessmentResult, Attendance, Certificate, Enrollment, Filter, Placement, ProgressReport,
    StudentProfile, Transition,
};
use std::sync::Arc;
use uuid::Uuid;

use super::crud;
use crate::error::{ApiResult, Params, PathId};
use crate::middleware::auth::CurrentCaller;
use crate::models::*;
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .nest(
            &crud::at::<StudentProfile>(),
            crud::resource::<StudentProfile>()
                .route("/:id/enrollments", crud::children::<StudentProfile, Enrollment>(Filter::student))
                .route("/:id/certificates", crud::children::<StudentProfile, Certificate>(Filter::student))
                .route("/:id/progress", get(progress))
                .route("/:id/attendance-by-month", get(attendance_by_month)),
        )
        .nest(
            &crud::at::<Enrollment>(),
            crud::resource::<Enrollment>()
                .route("/:id/complete", crud::action::<Enrollment>(Transition::Complete))
                .route("/:id/attendance", crud::children::<Enrollment, Attendance>(Filter::enrollment))
                .route(
                    "/:id/assessments",
                    crud::children::<Enrollment, AssessmentResult>(Filter::enrollment),
                )
                .route(
                    "/:id/progress-reports",
                    crud::children::<Enrollment, ProgressReport>(Filter::enrollment),
                ),
        )
        .nest(&crud::at::<Attendance>(), crud::resource::<Attendance>())
        .nest(&crud::at::<AssessmentResult>(), crud::resource::<AssessmentResult>())
        .nest(&crud::at::<ProgressReport>(), crud::resource::<ProgressReport>())
        .nest(&crud::at::<Placement>(), crud::resource::<Placement>())
}

/// Progress summary for one student
#[utoipa::path(
    get,
    path = "/api/students/students/{id}/progress",
    params(("id" = Uuid, Path, description = "Student profile ID")),
    responses(
        (status = 200, description = "Student progress", body = StudentProgress),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    tag = "students",
    security(("bearer" = []))
)]
pub async fn progress(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
    PathId(id): PathId<Uuid>,
) -> ApiResult<Json<ApiResponse<StudentProgress>>> {
    Ok(Json(ApiResponse::success(state.store.student_progress(&caller, id)?)))
}

/// Attendance per calendar month, oldest first
#[utoipa::path(
    get,
    path = "/api/students/students/{id}/attendance-by-month",
    params(
        ("id" = Uuid, Path, description = "Student profile ID"),
        ("months" = Option<u32>, Query, description = "Months to cover, default 6")
    ),
    responses(
        (status = 200, description = "Monthly attendance", body = [AttendanceMonth]),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    tag = "students",
    security(("bearer" = []))
)]
pub async fn attendance_by_month(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
    PathId(id): PathId<Uuid>,
    Params(params): Params<MonthsParams>,
) -> ApiResult<Json<ApiResponse<Vec<AttendanceMonth>>>> {
    let months = state.store.attendance_by_month(&caller, id, params.months)?;
    Ok(Json(ApiResponse::success(months)))
}
