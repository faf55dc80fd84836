//! HTTP helpers shared by the provider clients
//!
//! Maps transport and status failures onto the gateway taxonomy.

use crate::auth::AuthError;
use crate::error::AppError;
use reqwest::{Response, StatusCode};

/// Classify a request that never produced a response
pub fn send_error(provider: &str, err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        tracing::warn!(provider = %provider, "Provider request timed out");
        return AppError::ProviderTimeout(format!("{} request timed out: {}", provider, err));
    }
    AppError::Provider(format!(
        "Failed to send HTTP request to {}: {}",
        provider, err
    ))
}

/// Turn a non-2xx response into a classified error, consuming the body
///
/// `bearer_auth` marks providers authenticated with an OAuth token, whose
/// 401/403 answers are credential failures rather than provider failures.
pub async fn status_error(provider: &str, response: Response, bearer_auth: bool) -> AppError {
    let status = response.status();
    let error_body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error body".to_string());

    tracing::error!(
        provider = %provider,
        status_code = status.as_u16(),
        error_body = %error_body,
        "Provider returned error status"
    );

    if bearer_auth && matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return AppError::Auth(AuthError::CredentialRejected(status.as_u16()));
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return AppError::Provider(format!(
            "{} rate limit exceeded (HTTP {}): {}",
            provider,
            status.as_u16(),
            error_body
        ));
    }

    AppError::Provider(format!(
        "{} returned error status {}: {}",
        provider,
        status.as_u16(),
        error_body
    ))
}

/// Read and parse a 2xx JSON body
pub async fn read_json<T: serde::de::DeserializeOwned>(
    provider: &str,
    response: Response,
) -> Result<T, AppError> {
    let body = response.text().await.map_err(|e| {
        AppError::Provider(format!("Failed to read response body from {}: {}", provider, e))
    })?;

    serde_json::from_str(&body).map_err(|e| {
        AppError::Provider(format!(
            "Failed to parse JSON response from {}: {} - Response body: {}",
            provider, e, body
        ))
    })
}
