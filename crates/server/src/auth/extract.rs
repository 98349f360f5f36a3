//! Route-level authorization extractor.
//!
//! The resolver middleware only computes identity; demanding one is a
//! route's decision. Handlers take `RequireAuth` to reject anonymous
//! callers with an authorization failure.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::resolver::CurrentUser;
use crate::token::Claims;

/// Error type for authentication and authorization failures.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthError {
    /// Error code (e.g., "unauthorized", "forbidden")
    pub error: String,
    /// Human-readable error description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl AuthError {
    pub fn unauthorized(description: impl Into<String>) -> Self {
        Self {
            error: "unauthorized".to_string(),
            error_description: Some(description.into()),
        }
    }

    pub fn forbidden(description: impl Into<String>) -> Self {
        Self {
            error: "forbidden".to_string(),
            error_description: Some(description.into()),
        }
    }

    pub fn invalid_request(description: impl Into<String>) -> Self {
        Self {
            error: "invalid_request".to_string(),
            error_description: Some(description.into()),
        }
    }

    pub fn conflict(description: impl Into<String>) -> Self {
        Self {
            error: "conflict".to_string(),
            error_description: Some(description.into()),
        }
    }

    pub fn server_error() -> Self {
        Self {
            error: "server_error".to_string(),
            error_description: None,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self.error.as_str() {
            "invalid_request" => StatusCode::BAD_REQUEST,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "conflict" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Extractor that rejects requests the resolver left anonymous.
///
/// # Example
///
/// ```ignore
/// async fn handler(RequireAuth(claims): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}", claims.email)
/// }
/// ```
pub struct RequireAuth(pub Claims);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .map(|current| RequireAuth(current.0.clone()))
            .ok_or_else(|| AuthError::forbidden("Authentication required"))
    }
}
