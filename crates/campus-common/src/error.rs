//! Error types for the campus service

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Per-field validation messages, keyed by input field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Empty error set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Record a message when `failed` holds
    pub fn check(&mut self, failed: bool, field: &str, message: &str) {
        if failed {
            self.add(field, message);
        }
    }

    /// No field failed
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for a field
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when empty, a validation error otherwise
    pub fn into_result(self) -> CampusResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CampusError::Validation(self))
        }
    }
}

/// Campus error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CampusError {
    /// Malformed or missing input
    #[error("validation failed")]
    Validation(FieldErrors),

    /// Caller lacks the role or ownership for the action
    #[error("permission denied")]
    PermissionDenied,

    /// Record does not exist or lies outside the caller's scope
    #[error("not found")]
    NotFound,

    /// Duplicate unique field
    #[error("conflict: {0}")]
    Conflict(String),

    /// State transition out of an incompatible state
    #[error("cannot {transition} {entity} in state {from}")]
    InvalidTransition {
        entity: &'static str,
        transition: &'static str,
        from: String,
    },

    /// Bad credentials or token
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// Failure that is not the caller's fault
    #[error("internal error: {0}")]
    Internal(String),
}

impl CampusError {
    /// Single-field validation error
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }
}

/// Result type for campus operations
pub type CampusResult<T> = Result<T, CampusError>;
