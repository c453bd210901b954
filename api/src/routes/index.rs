//! Endpoint index

use axum::Json;
use campus_common::EntityKind;

use crate::models::{ApiResponse, IndexArea, IndexEntry};

/// Resource collections grouped by area, in declaration order
pub fn areas() -> Vec<IndexArea> {
    let mut areas: Vec<IndexArea> = Vec::new();
    for kind in EntityKind::ALL {
        let entry = IndexEntry {
            name: kind.slug().to_string(),
            url: format!("/api/{}/{}", kind.area(), kind.slug()),
        };
        match areas.iter_mut().find(|a| a.area == kind.area()) {
            Some(area) => area.endpoints.push(entry),
            None => areas.push(IndexArea { area: kind.area().to_string(), endpoints: vec![entry] }),
        }
    }
    areas
}

/// List the API's resource endpoints
#[utoipa::path(
    get,
    path = "/api",
    responses(
        (status = 200, description = "Endpoints by area", body = [IndexArea])
    ),
    tag = "health"
)]
pub async fn api_index() -> Json<ApiResponse<Vec<IndexArea>>> {
    Json(ApiResponse::success(areas()))
}
