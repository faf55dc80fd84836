//! Error types and error handling for the gateway
//!
//! `AppError` is the single classified taxonomy every layer reports in.
//! Provider clients normalize their own failure shapes into it before the
//! orchestrator sees them, and it converts into an HTTP response for the
//! synchronous paths (validation, lookups).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Gateway error taxonomy
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or malformed request fields, detected before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Credential exchange with the OAuth provider failed
    #[error("Authentication error: {0}")]
    Auth(#[from] crate::auth::AuthError),

    /// Provider answered with a non-2xx status or reported a failure
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider call exceeded the configured timeout
    #[error("Provider timed out: {0}")]
    ProviderTimeout(String),

    /// Provider answered 2xx but the expected result field was absent
    #[error("Missing artifact: {0}")]
    MissingArtifact(String),

    /// A job state change broke the lifecycle state machine
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Unknown project, job or task id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Serializable classification of an [`AppError`]
///
/// This is what a failed job carries, so the status endpoint can report
/// the class of failure without leaking provider-specific shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`AppError::Validation`]
    Validation,
    /// See [`AppError::Auth`]
    Auth,
    /// See [`AppError::Provider`]
    Provider,
    /// See [`AppError::ProviderTimeout`]
    ProviderTimeout,
    /// See [`AppError::MissingArtifact`]
    MissingArtifact,
    /// See [`AppError::InvalidTransition`]
    InvalidTransition,
    /// See [`AppError::NotFound`]
    NotFound,
    /// See [`AppError::Internal`]
    Internal,
}

impl AppError {
    /// Classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Auth(_) => ErrorKind::Auth,
            AppError::Provider(_) => ErrorKind::Provider,
            AppError::ProviderTimeout(_) => ErrorKind::ProviderTimeout,
            AppError::MissingArtifact(_) => ErrorKind::MissingArtifact,
            AppError::InvalidTransition(_) => ErrorKind::InvalidTransition,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Auth(_) => StatusCode::BAD_GATEWAY,
            AppError::Provider(_) => StatusCode::BAD_GATEWAY,
            AppError::MissingArtifact(_) => StatusCode::BAD_GATEWAY,
            AppError::ProviderTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let response = AppError::Validation("prompt is empty".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let response = AppError::NotFound("job abc".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let kind = AppError::ProviderTimeout("after 60 seconds".to_string()).kind();
        assert_eq!(
            serde_json::to_string(&kind).unwrap(),
            "\"provider_timeout\""
        );
    }
}
