//! Generic resource handlers
//!
//! Every record kind is served by the same list/detail/create/update/delete
//! handlers, instantiated per type. Scoping and permission checks happen in
//! the store; handlers only translate.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, MethodRouter},
    Json, Router,
};
use campus_common::{Filter, Record, Resource, Stateful, Transition};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, Body, Params, PathId};
use crate::middleware::auth::CurrentCaller;
use crate::models::{ApiResponse, PageParams, PaginatedResponse};
use crate::ApiState;

type Page<T> = Json<ApiResponse<PaginatedResponse<T>>>;

/// List, detail, create, update and delete for `T`, to be nested at the
/// kind's slug
pub fn resource<T: Resource>() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(list::<T>).post(create::<T>))
        .route("/:id", get(detail::<T>).put(update::<T>).delete(remove::<T>))
}

/// Nest path for a kind
pub fn at<T: Record>() -> String {
    format!("/{}", T::KIND.slug())
}

pub async fn list<T: Record>(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
    Params(page): Params<PageParams>,
    Params(filter): Params<Filter>,
) -> ApiResult<Page<T>> {
    let items = state.store.list::<T>(&caller, &filter)?;
    Ok(Json(ApiResponse::success(state.page(items.into_vec(), &page))))
}

pub async fn detail<T: Record>(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
    PathId(id): PathId<Uuid>,
) -> ApiResult<Json<ApiResponse<T>>> {
    Ok(Json(ApiResponse::success(state.store.get::<T>(&caller, id)?)))
}

pub async fn create<T: Resource>(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
    Body(input): Body<T::Input>,
) -> ApiResult<(StatusCode, Json<ApiResponse<T>>)> {
    let record = state.store.create::<T>(&caller, input)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(record))))
}

pub async fn update<T: Resource>(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
    PathId(id): PathId<Uuid>,
    Body(input): Body<T::Input>,
) -> ApiResult<Json<ApiResponse<T>>> {
    Ok(Json(ApiResponse::success(state.store.update::<T>(&caller, id, input)?)))
}

pub async fn remove<T: Record>(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
    PathId(id): PathId<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state.store.delete::<T>(&caller, id)?;
    Ok(Json(ApiResponse::success(())))
}

/// `POST /:id/<transition>` for a stateful kind
pub fn action<T: Stateful>(transition: Transition) -> MethodRouter<Arc<ApiState>> {
    post(
        move |State(state): State<Arc<ApiState>>,
              CurrentCaller(caller): CurrentCaller,
              PathId(id): PathId<Uuid>| async move {
            let outcome = state.store.transition::<T>(&caller, id, transition)?;
            Ok::<_, ApiError>(Json(ApiResponse::success(outcome.record)))
        },
    )
}

/// `GET /:id/<children>`: records of `C` under a visible parent `P`
pub fn children<P: Record, C: Record>(filter: fn(Uuid) -> Filter) -> MethodRouter<Arc<ApiState>> {
    get(
        move |State(state): State<Arc<ApiState>>,
              CurrentCaller(caller): CurrentCaller,
              PathId(id): PathId<Uuid>,
              Params(page): Params<PageParams>| async move {
            let items = state.store.list_under::<P, C>(&caller, id, &filter(id))?;
            Ok::<_, ApiError>(Json(ApiResponse::success(state.page(items.into_vec(), &page))))
        },
    )
}
