//! Account endpoints: registration, login, profile and background checks

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use campus_common::{Account, AccountId, BackgroundCheck, ProfileUpdate, Registration, Transition};
use std::sync::Arc;

use super::crud;
use crate::error::{ApiResult, Body};
use crate::middleware::auth::{CurrentCaller, TokenType};
use crate::models::*;
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .nest("/users", users())
        .nest(
            "/background-checks",
            crud::resource::<BackgroundCheck>()
                .route("/:id/approve", crud::action::<BackgroundCheck>(Transition::Approve))
                .route("/:id/reject", crud::action::<BackgroundCheck>(Transition::Reject)),
        )
}

fn users() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me).patch(update_me))
        .route("/search", get(crud::list::<Account>))
        .merge(crud::resource::<Account>())
}

/// `/api/token`
pub fn token_router() -> Router<Arc<ApiState>> {
    Router::new().route("/refresh", post(refresh))
}

fn issue(state: &ApiState, user: Account) -> ApiResult<AuthResponse> {
    let tokens = state.tokens.issue(user.id, user.role)?;
    Ok(AuthResponse { user, tokens })
}

/// Register a non-admin account
#[utoipa::path(
    post,
    path = "/api/accounts/users/register",
    request_body = Registration,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    tag = "accounts"
)]
pub async fn register(
    State(state): State<Arc<ApiState>>,
    Body(registration): Body<Registration>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AuthResponse>>)> {
    let user = state.store.register(registration)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(issue(&state, user)?))))
}

/// Exchange credentials for a token pair
#[utoipa::path(
    post,
    path = "/api/accounts/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    tag = "accounts"
)]
pub async fn login(
    State(state): State<Arc<ApiState>>,
    Body(request): Body<LoginRequest>,
) -> ApiResult<Json<ApiResponse<AuthResponse>>> {
    let user = state.store.authenticate(&request.email, &request.password)?;
    tracing::info!(user = %user.id, "Login");
    Ok(Json(ApiResponse::success(issue(&state, user)?)))
}

/// Exchange a refresh token for a new pair
#[utoipa::path(
    post,
    path = "/api/token/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Invalid refresh token", body = ErrorResponse)
    ),
    tag = "accounts"
)]
pub async fn refresh(
    State(state): State<Arc<ApiState>>,
    Body(request): Body<RefreshRequest>,
) -> ApiResult<Json<ApiResponse<TokenPair>>> {
    let claims = state.tokens.verify(&request.refresh, TokenType::Refresh)?;
    let account = AccountId(claims.sub);
    let role = state.store.caller(account)?.role().unwrap_or(claims.role);
    Ok(Json(ApiResponse::success(state.tokens.issue(account, role)?)))
}

/// The caller's own account
#[utoipa::path(
    get,
    path = "/api/accounts/users/me",
    responses(
        (status = 200, description = "Current account"),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "accounts",
    security(("bearer" = []))
)]
pub async fn me(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
) -> ApiResult<Json<ApiResponse<Account>>> {
    Ok(Json(ApiResponse::success(state.store.me(&caller)?)))
}

/// Edit the caller's own profile
#[utoipa::path(
    patch,
    path = "/api/accounts/users/me",
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Updated account"),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "accounts",
    security(("bearer" = []))
)]
pub async fn update_me(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
    Body(update): Body<ProfileUpdate>,
) -> ApiResult<Json<ApiResponse<Account>>> {
    Ok(Json(ApiResponse::success(state.store.update_profile(&caller, update)?)))
}
