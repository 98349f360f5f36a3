//! User registration endpoint.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::AppResources;
use crate::api::USERS_TAG;
use crate::auth::AuthError;
use crate::entity::user;
use crate::users::CreateUserError;

const MIN_PASSWORD_LEN: usize = 6;

/// Registration request body. The password must be confirmed.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub name: Option<String>,
    pub password: String,
    pub password_confirmation: String,
}

/// The created account, without credential material.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    /// Unix timestamp.
    pub created_at: i64,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            picture: model.picture,
            created_at: model.created_at.unix_timestamp(),
        }
    }
}

/// Creates the users router.
pub fn router() -> OpenApiRouter<AppResources> {
    OpenApiRouter::new().routes(routes!(create_user))
}

fn validate(payload: &CreateUserRequest) -> Result<(), AuthError> {
    if payload.email.is_empty() || !payload.email.contains('@') {
        return Err(AuthError::invalid_request("A valid email is required"));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::invalid_request(
            "Password must be at least 6 characters",
        ));
    }
    if payload.password != payload.password_confirmation {
        return Err(AuthError::invalid_request("Passwords do not match"));
    }
    Ok(())
}

/// Register a password account.
#[tracing::instrument(skip(resources, payload), fields(email = %payload.email))]
#[utoipa::path(
    post,
    path = "/",
    tag = USERS_TAG,
    operation_id = "Create User",
    summary = "Register with email and password",
    description = "Creates a password account. The email must be unused; federated accounts \
                   occupy their email too. The response never includes credential material.",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid email, short password or mismatched confirmation", body = AuthError),
        (status = 409, description = "Email already registered", body = AuthError),
        (status = 500, description = "Storage failure", body = AuthError),
    )
)]
async fn create_user(
    State(resources): State<AppResources>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<UserResponse>, AuthError> {
    validate(&payload)?;

    let user = resources
        .users()
        .create(&payload.email, payload.name.as_deref(), &payload.password)
        .await
        .map_err(|e| match e {
            CreateUserError::EmailTaken => {
                AuthError::conflict("An account with this email already exists")
            }
            other => {
                tracing::error!(error = %other, "user registration failed");
                AuthError::server_error()
            }
        })?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(password: &str, confirmation: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: "jane@example.com".to_string(),
            name: Some("Jane".to_string()),
            password: password.to_string(),
            password_confirmation: confirmation.to_string(),
        }
    }

    #[test]
    fn validation_rejects_short_and_mismatched_passwords() {
        assert!(validate(&request("hunter2!", "hunter2!")).is_ok());
        assert!(validate(&request("short", "short")).is_err());
        assert!(validate(&request("hunter2!", "hunter3!")).is_err());
    }

    #[test]
    fn validation_rejects_bad_email() {
        let mut payload = request("hunter2!", "hunter2!");
        payload.email = "not-an-email".to_string();
        assert!(validate(&payload).is_err());
    }
}
