//! Token authentication
//!
//! Access and refresh tokens are HS256 JWTs carrying the account id, role
//! and token type. Requests present the access token as a bearer header, or
//! (for pages) in the `campus_token` cookie. The caller is rebuilt from the
//! store on every request, so deactivated accounts lose access immediately.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use campus_common::{AccountId, Caller, CampusError, Role};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::TokenPair;
use crate::ApiState;

/// Cookie holding the access token for server-rendered pages
pub const SESSION_COOKIE: &str = "campus_token";

/// Which half of a token pair a token is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub token_type: TokenType,
    pub exp: i64,
    pub iat: i64,
}

/// Token failures; all surface as 401
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("invalid or expired token")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("expected an {expected:?} token")]
    WrongType { expected: TokenType },

    #[error("failed to sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

impl From<TokenError> for CampusError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Signing(e) => CampusError::Internal(e.to_string()),
            other => CampusError::AuthFailed(other.to_string()),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(error: TokenError) -> Self {
        ApiError(error.into())
    }
}

/// Issues and checks token pairs
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: i64,
    refresh_ttl: i64,
}

impl TokenIssuer {
    pub fn new(secret: &str, access_ttl: i64, refresh_ttl: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    fn sign(&self, account: AccountId, role: Role, token_type: TokenType, ttl: i64) -> Result<String, TokenError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: account.0,
            role,
            token_type,
            exp: now + ttl,
            iat: now,
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(TokenError::Signing)
    }

    pub fn issue(&self, account: AccountId, role: Role) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access: self.sign(account, role, TokenType::Access, self.access_ttl)?,
            refresh: self.sign(account, role, TokenType::Refresh, self.refresh_ttl)?,
        })
    }

    /// Decodes a token and checks it is of the expected type
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding, &Validation::default())?.claims;
        if claims.token_type != expected {
            return Err(TokenError::WrongType { expected });
        }
        Ok(claims)
    }
}

fn bearer(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

fn session_cookie(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token)
}

/// Resolves a verified access token to the current caller
fn resolve(state: &ApiState, token: &str) -> Result<Caller, ApiError> {
    let claims = state.tokens.verify(token, TokenType::Access)?;
    Ok(state.store.caller(AccountId(claims.sub))?)
}

/// The per-request caller.
///
/// No credentials give [`Caller::Anonymous`]; a bad bearer token is a 401.
/// A stale session cookie is treated as no credentials so pages can send
/// the visitor back to the login form.
#[derive(Debug, Clone, Copy)]
pub struct CurrentCaller(pub Caller);

#[axum::async_trait]
impl FromRequestParts<Arc<ApiState>> for CurrentCaller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<ApiState>) -> Result<Self, Self::Rejection> {
        if let Some(token) = bearer(parts) {
            return resolve(state, token).map(CurrentCaller);
        }
        if let Some(token) = session_cookie(parts) {
            return Ok(CurrentCaller(resolve(state, token).unwrap_or(Caller::Anonymous)));
        }
        Ok(CurrentCaller(Caller::Anonymous))
    }
}
