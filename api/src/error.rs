//! HTTP error mapping

use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Request,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use campus_common::CampusError;
use serde::de::DeserializeOwned;

use crate::models::{ApiResponse, ErrorResponse};

/// A [`CampusError`] on its way out as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub CampusError);

/// Handler result
pub type ApiResult<T> = Result<T, ApiError>;

impl From<CampusError> for ApiError {
    fn from(error: CampusError) -> Self {
        Self(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(CampusError::invalid("body", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(CampusError::invalid("query", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(CampusError::invalid("id", rejection.body_text()))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CampusError::Validation(_) => StatusCode::BAD_REQUEST,
            CampusError::AuthFailed(_) => StatusCode::UNAUTHORIZED,
            CampusError::PermissionDenied => StatusCode::FORBIDDEN,
            CampusError::NotFound => StatusCode::NOT_FOUND,
            CampusError::Conflict(_) | CampusError::InvalidTransition { .. } => StatusCode::CONFLICT,
            CampusError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        let (code, message, fields) = match &self.0 {
            CampusError::Validation(fields) => ("validation_error", self.0.to_string(), Some(fields.clone())),
            CampusError::AuthFailed(reason) => ("unauthorized", reason.clone(), None),
            CampusError::PermissionDenied => ("permission_denied", self.0.to_string(), None),
            CampusError::NotFound => ("not_found", self.0.to_string(), None),
            CampusError::Conflict(reason) => ("conflict", reason.clone(), None),
            CampusError::InvalidTransition { .. } => ("invalid_transition", self.0.to_string(), None),
            CampusError::Internal(_) => ("internal_error", "internal server error".to_string(), None),
        };
        ErrorResponse { code: code.into(), message, fields }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = Json(ApiResponse::<()>::failure(self.body()));
        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

/// JSON body whose rejections use the error envelope
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Body<T>(pub T);

/// JSON body that may be left out; only an empty body reads as `None`,
/// anything else has to parse
#[derive(Debug)]
pub struct OptionalBody<T>(pub Option<T>);

#[axum::async_trait]
impl<T, S> FromRequest<S> for OptionalBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| CampusError::invalid("body", rejection.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(None));
        }
        match serde_json::from_slice(&bytes) {
            Ok(input) => Ok(Self(Some(input))),
            Err(e) => Err(CampusError::invalid("body", e.to_string()).into()),
        }
    }
}

/// Query parameters whose rejections use the error envelope
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Params<T>(pub T);

/// Path parameters whose rejections use the error envelope
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathId<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError(CampusError::invalid("x", "bad")).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError(CampusError::AuthFailed("no".into())).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError(CampusError::PermissionDenied).status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError(CampusError::NotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError(CampusError::Conflict("dup".into())).status(), StatusCode::CONFLICT);
        let transition = CampusError::InvalidTransition {
            entity: "payment",
            transition: "mark-paid",
            from: "refunded".into(),
        };
        assert_eq!(ApiError(transition).status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_validation_body_carries_fields() {
        let body = ApiError(CampusError::invalid("email", "enter a valid email address")).body();
        assert_eq!(body.code, "validation_error");
        assert_eq!(
            body.fields.unwrap().get("email"),
            Some(&["enter a valid email address".to_string()][..])
        );
    }

    async fn optional(body: &'static str) -> Result<Option<serde_json::Value>, ApiError> {
        let req = axum::http::Request::builder()
            .body(axum::body::Body::from(body))
            .unwrap();
        OptionalBody::from_request(req, &()).await.map(|OptionalBody(value)| value)
    }

    #[tokio::test]
    async fn test_optional_body_only_skips_empty_input() {
        assert!(optional("").await.unwrap().is_none());
        assert!(optional("  \n").await.unwrap().is_none());
        assert_eq!(optional(r#"{"a":1}"#).await.unwrap().unwrap()["a"], 1);

        let err = optional("{not json").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(matches!(err.0, CampusError::Validation(ref fields) if fields.get("body").is_some()));
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let body = ApiError(CampusError::Internal("db exploded".into())).body();
        assert_eq!(body.message, "internal server error");
    }
}
