//! Course catalog endpoints

use axum::{extract::State, routing::get, Json, Router};
use campus_common::reports::{CourseStatistics, PopularCourse};
use campus_common::{
    Assessment, Course, CourseCategory, CourseModule, Enrollment, Filter, InstructorProfile,
};
use std::sync::Arc;
use uuid::Uuid;

use super::crud;
use crate::error::{ApiResult, PathId};
use crate::middleware::auth::CurrentCaller;
use crate::models::*;
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .nest(&crud::at::<CourseCategory>(), crud::resource::<CourseCategory>())
        .nest(
            &crud::at::<Course>(),
            crud::resource::<Course>()
                .route("/popular", get(popular))
                .route("/:id/statistics", get(statistics))
                .route("/:id/enrollments", crud::children::<Course, Enrollment>(Filter::course)),
        )
        .nest(&crud::at::<CourseModule>(), crud::resource::<CourseModule>())
        .nest(
            &crud::at::<InstructorProfile>(),
            crud::resource::<InstructorProfile>()
                .route("/:id/courses", crud::children::<InstructorProfile, Course>(Filter::instructor)),
        )
        .nest(&crud::at::<Assessment>(), crud::resource::<Assessment>())
}

/// Most enrolled courses
#[utoipa::path(
    get,
    path = "/api/courses/courses/popular",
    responses(
        (status = 200, description = "Top courses by enrollment", body = [PopularCourse])
    ),
    tag = "courses"
)]
pub async fn popular(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
) -> ApiResult<Json<ApiResponse<Vec<PopularCourse>>>> {
    Ok(Json(ApiResponse::success(state.store.popular_courses(&caller)?)))
}

/// Enrollment and grading statistics for one course
#[utoipa::path(
    get,
    path = "/api/courses/courses/{id}/statistics",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course statistics", body = CourseStatistics),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    tag = "courses"
)]
pub async fn statistics(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
    PathId(id): PathId<Uuid>,
) -> ApiResult<Json<ApiResponse<CourseStatistics>>> {
    Ok(Json(ApiResponse::success(state.store.course_statistics(&caller, id)?)))
}
