use axum::http::StatusCode;
use thiserror::Error;

/// Failures of the identity federation exchange.
///
/// Provider-side failures (HTTP, network, timeout, malformed body) surface
/// to the browser only as a redirect to the client's error page; the
/// unverified-email and storage cases are explicit authorization
/// rejections.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("Provider returned HTTP {status}: {context}")]
    Http { status: StatusCode, context: String },
    #[error("Network error calling provider: {0}")]
    Network(String),
    #[error("Timeout after {0:?} calling provider")]
    Timeout(std::time::Duration),
    #[error("Invalid JSON from provider: {0}")]
    Json(String),
    #[error("{0}")]
    UnverifiedEmail(&'static str),
    #[error("Storage error: {0}")]
    Storage(#[from] sea_orm::DbErr),
    #[error("Credential issuance failed: {0}")]
    Issuance(#[from] jsonwebtoken::errors::Error),
}

impl ExchangeError {
    pub fn from_reqwest(e: reqwest::Error, timeout: std::time::Duration) -> Self {
        if e.is_timeout() {
            ExchangeError::Timeout(timeout)
        } else if e.is_decode() {
            ExchangeError::Json(e.to_string())
        } else {
            ExchangeError::Network(e.to_string())
        }
    }

    /// True for failures of the provider conversation itself, which end in
    /// a redirect to the error page instead of an explicit rejection.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            ExchangeError::Http { .. }
                | ExchangeError::Network(_)
                | ExchangeError::Timeout(_)
                | ExchangeError::Json(_)
        )
    }
}
