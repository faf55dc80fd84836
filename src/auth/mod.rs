//! Provider authentication
//!
//! Short-lived bearer credentials for OAuth-based providers. A
//! [`TokenCache`] sits in front of a [`TokenExchanger`] (in production the
//! service-account JWT-bearer flow) and hands out cached tokens until they
//! are about to expire.

pub mod service_account;
pub mod token_cache;

pub use service_account::{JwtBearerExchanger, ServiceAccountKey};
pub use token_cache::{CachedCredential, IssuedToken, TokenCache, TokenExchanger};

use thiserror::Error;

/// Errors raised while obtaining a provider credential
///
/// None of these are retried: the job that needed the credential fails.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Service-account file could not be read
    #[error("Failed to read service account file {path}: {source}")]
    Io {
        /// Path that was read
        path: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Service-account JSON is missing fields or is not JSON
    #[error("Malformed service account credentials: {0}")]
    MalformedCredentials(String),

    /// Private key could not be used to sign the assertion
    #[error("Failed to sign token assertion: {0}")]
    Signing(String),

    /// Token endpoint could not be reached
    #[error("Token endpoint request failed: {0}")]
    Request(String),

    /// Token endpoint answered with a non-2xx status
    #[error("Token endpoint returned status {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body as returned by the endpoint
        body: String,
    },

    /// Token endpoint answered 2xx without a usable token
    #[error("Malformed token response: {0}")]
    MalformedResponse(String),

    /// A provider refused an issued bearer token
    #[error("Provider rejected the bearer credential (HTTP {0})")]
    CredentialRejected(u16),
}
