//! API Models

use campus_common::{Account, FieldErrors};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard API response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorResponse>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn error(code: &str, message: &str) -> Self {
        Self::failure(ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
            fields: None,
        })
    }

    pub fn failure(error: ErrorResponse) -> Self {
        Self { success: false, data: None, error: Some(error) }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    /// Per-field validation messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub fields: Option<FieldErrors>,
}

/// Paginated response
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    /// One page of `items`; pages are 1-based and out-of-range pages are
    /// empty
    pub fn paginate(items: Vec<T>, page: u32, per_page: u32) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let total = items.len() as u64;
        let total_pages = total.div_ceil(u64::from(per_page)) as u32;
        let skip = (page as usize - 1).saturating_mul(per_page as usize);
        Self {
            items: items.into_iter().skip(skip).take(per_page as usize).collect(),
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

/// Pagination query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

// ============ Auth ============

/// Login request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Refresh request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Issued on registration and login
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    #[schema(value_type = Object)]
    pub user: Account,
    pub tokens: TokenPair,
}

// ============ Queries ============

/// Month window for trend reports
#[derive(Debug, Default, Deserialize)]
pub struct MonthsParams {
    pub months: Option<u32>,
}

/// Certificate lookup
#[derive(Debug, Default, Deserialize)]
pub struct VerifyParams {
    pub code: Option<String>,
}

// ============ Index ============

/// One listed endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct IndexEntry {
    pub name: String,
    pub url: String,
}

/// Endpoints of one area
#[derive(Debug, Serialize, ToSchema)]
pub struct IndexArea {
    pub area: String,
    pub endpoints: Vec<IndexEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_counts_pages() {
        let page = PaginatedResponse::paginate((1..=45).collect::<Vec<_>>(), 3, 20);
        assert_eq!(page.items, (41..=45).collect::<Vec<_>>());
        assert_eq!(page.total, 45);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_paginate_past_the_end_is_empty() {
        let page = PaginatedResponse::paginate(vec![1, 2, 3], 9, 2);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 2);

        let empty = PaginatedResponse::<u8>::paginate(vec![], 1, 20);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_error_envelope_omits_empty_fields() {
        let body = serde_json::to_value(ApiResponse::<()>::error("not_found", "not found")).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "not_found");
        assert!(body["error"].get("fields").is_none());
    }
}
