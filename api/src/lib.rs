//! Campus API - REST and server-rendered front end for the school
//! administration service
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                            campus-api                               │
//! │                                                                     │
//! │  ┌───────────────────────────────────────────────────────────────┐  │
//! │  │                          REST API                             │  │
//! │  │   /api/* JSON | JWT access + refresh | OpenAPI at /docs       │  │
//! │  └───────────────────────────────────────────────────────────────┘  │
//! │  ┌───────────────────────────────────────────────────────────────┐  │
//! │  │                           Pages                               │  │
//! │  │   /, /login, /dashboard, /pages/* | session cookie            │  │
//! │  └───────────────────────────────────────────────────────────────┘  │
//! │                               │                                     │
//! │                               ▼                                     │
//! │  ┌───────────────────────────────────────────────────────────────┐  │
//! │  │          campus-common Store (scoper, gatekeeper, reports)    │  │
//! │  └───────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod pages;
pub mod routes;

use axum::{routing::get, Router};
use campus_common::Store;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use models::*;

use middleware::auth::TokenIssuer;
use pages::Pages;

/// API state
pub struct ApiState {
    pub store: Store,
    pub tokens: TokenIssuer,
    pub config: ServerConfig,
    pub pages: Pages,
}

impl ApiState {
    /// Builds the state around an empty store
    pub fn new(mut config: ServerConfig) -> Result<Self, handlebars::TemplateError> {
        if config.ensure_secret() {
            tracing::warn!("No JWT secret configured, generated one; tokens will not survive a restart");
        }
        Ok(Self {
            store: Store::new(),
            tokens: TokenIssuer::new(&config.jwt_secret, config.access_ttl_secs, config.refresh_ttl_secs),
            pages: Pages::new()?,
            config,
        })
    }

    /// Creates the configured admin account if it does not exist yet
    pub fn bootstrap_admin(&self) -> campus_common::CampusResult<()> {
        let (Some(email), Some(password)) = (&self.config.admin_email, &self.config.admin_password) else {
            return Ok(());
        };
        if self.store.ensure_admin(email, password)? {
            tracing::info!(%email, "Created admin account");
        }
        Ok(())
    }

    /// One page of a list, sized by config
    pub fn page<T>(&self, items: Vec<T>, params: &PageParams) -> PaginatedResponse<T> {
        PaginatedResponse::paginate(
            items,
            params.page.unwrap_or(1),
            self.config.page_size(params.per_page),
        )
    }
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Campus API",
        version = "0.1.0",
        description = "Vocational school administration: courses, students, employers, certifications and financials",
        license(name = "Apache-2.0")
    ),
    paths(
        routes::health::health_check,
        routes::index::api_index,
        routes::accounts::register,
        routes::accounts::login,
        routes::accounts::me,
        routes::accounts::update_me,
        routes::accounts::refresh,
        routes::courses::popular,
        routes::courses::statistics,
        routes::students::progress,
        routes::students::attendance_by_month,
        routes::certifications::verify,
        routes::financials::summary,
        routes::financials::monthly_revenue,
        routes::dashboard::stats,
    ),
    components(
        schemas(
            ErrorResponse, LoginRequest, RefreshRequest, TokenPair, AuthResponse,
            IndexArea, IndexEntry,
            routes::health::HealthResponse,
            campus_common::Registration, campus_common::ProfileUpdate,
            campus_common::CertificateVerification,
            campus_common::reports::CourseStatistics,
            campus_common::reports::PopularCourse,
            campus_common::reports::StudentProgress,
            campus_common::reports::AttendanceMonth,
            campus_common::reports::FinancialSummary,
            campus_common::reports::MonthlyRevenue,
            campus_common::reports::DashboardStats,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness and endpoint index"),
        (name = "accounts", description = "Registration, login and profiles"),
        (name = "courses", description = "Course catalog and statistics"),
        (name = "students", description = "Student progress"),
        (name = "certifications", description = "Certificate verification"),
        (name = "financials", description = "Financial reports"),
        (name = "dashboard", description = "Headline statistics")
    )
)]
pub struct ApiDoc;

/// Build the application router
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes())
        .merge(pages::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(Arc::new(state))
}

fn api_routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(routes::index::api_index))
        .nest("/accounts", routes::accounts::router())
        .nest("/token", routes::accounts::token_router())
        .nest("/courses", routes::courses::router())
        .nest("/students", routes::students::router())
        .nest("/employers", routes::employers::router())
        .nest("/certifications", routes::certifications::router())
        .nest("/financials", routes::financials::router())
        .nest("/dashboard", routes::dashboard::router())
}
