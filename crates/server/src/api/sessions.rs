//! Session endpoints: password login, listing and revocation.

use axum::{Json, extract::State, http::HeaderMap, response::IntoResponse};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::AppResources;
use crate::api::SESSIONS_TAG;
use crate::auth::{AuthError, RequireAuth};
use crate::cookies::{self, ACCESS_COOKIE, REFRESH_COOKIE};
use crate::entity::session;
use crate::token::Claims;

/// Password login request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    pub email: String,
    pub password: String,
}

/// Both freshly issued credentials, also set as cookies.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// One active session, for the listing endpoint.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: String,
    pub user_id: String,
    pub user_agent: String,
    pub valid: bool,
    /// Unix timestamp.
    pub created_at: i64,
}

impl From<session::Model> for SessionResponse {
    fn from(model: session::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            user_agent: model.user_agent,
            valid: model.valid,
            created_at: model.created_at.unix_timestamp(),
        }
    }
}

/// Creates the sessions router.
pub fn router() -> OpenApiRouter<AppResources> {
    OpenApiRouter::new()
        .routes(routes!(create_session, list_sessions, delete_session))
}

fn user_agent(headers: &HeaderMap) -> &str {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Password login.
#[tracing::instrument(skip(resources, jar, payload), fields(email = %payload.email))]
#[utoipa::path(
    post,
    path = "/",
    tag = SESSIONS_TAG,
    operation_id = "Create Session",
    summary = "Log in with email and password",
    description = "Validates the password, creates a session and issues an access/refresh \
                   credential pair. Both credentials are returned in the body and set as \
                   HttpOnly cookies.\n\n\
                   Unknown email, wrong password and passwordless (federated-only) accounts \
                   all produce the same generic rejection.",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session created, credentials issued", body = TokenPair),
        (status = 401, description = "Invalid email or password", body = AuthError),
        (status = 500, description = "Storage failure", body = AuthError),
    )
)]
async fn create_session(
    State(resources): State<AppResources>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let user = resources
        .users()
        .validate_credentials(&payload.email, &payload.password)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "password validation failed against store");
            AuthError::server_error()
        })?
        .ok_or_else(|| AuthError::unauthorized("Invalid email or password"))?;

    let session = resources
        .sessions()
        .create(&user.id, user_agent(&headers))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "session creation failed");
            AuthError::server_error()
        })?;

    let issue = |ttl| {
        resources
            .codec
            .issue(&Claims::for_session(&user, &session.id, ttl))
            .map_err(|e| {
                tracing::error!(error = %e, "credential issuance failed");
                AuthError::server_error()
            })
    };
    let access_token = issue(resources.config.jwt.access_token_ttl_secs)?;
    let refresh_token = issue(resources.config.jwt.refresh_token_ttl_secs)?;

    tracing::info!(user_id = %user.id, session_id = %session.id, "password login succeeded");

    let jar = jar
        .add(cookies::access_cookie(&resources.config, &access_token))
        .add(cookies::refresh_cookie(&resources.config, &refresh_token));

    Ok((
        jar,
        Json(TokenPair {
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
        }),
    ))
}

/// List the caller's active sessions.
#[tracing::instrument(skip(resources))]
#[utoipa::path(
    get,
    path = "/",
    tag = SESSIONS_TAG,
    operation_id = "List Sessions",
    summary = "List the caller's active sessions",
    description = "Returns every still-valid session belonging to the resolved identity, \
                   newest first.",
    security(("Authorization" = [])),
    responses(
        (status = 200, description = "Active sessions", body = [SessionResponse]),
        (status = 403, description = "No identity resolved", body = AuthError),
    )
)]
async fn list_sessions(
    State(resources): State<AppResources>,
    RequireAuth(claims): RequireAuth,
) -> Result<Json<Vec<SessionResponse>>, AuthError> {
    let sessions = resources
        .sessions()
        .find_active(&claims.sub)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "session listing failed");
            AuthError::server_error()
        })?;
    Ok(Json(sessions.into_iter().map(Into::into).collect()))
}

/// Log out: revoke the caller's session and clear both cookies.
#[tracing::instrument(skip(resources, jar))]
#[utoipa::path(
    delete,
    path = "/",
    tag = SESSIONS_TAG,
    operation_id = "Delete Session",
    summary = "Log out",
    description = "Invalidates the session referenced by the caller's credentials and clears \
                   both credential cookies. Revoking an already-revoked session succeeds.\n\n\
                   Already-issued access credentials stay usable until their own expiry; \
                   revocation takes effect at the next refresh.",
    security(("Authorization" = [])),
    responses(
        (status = 200, description = "Session revoked, credentials cleared", body = TokenPair),
        (status = 403, description = "No identity resolved", body = AuthError),
    )
)]
async fn delete_session(
    State(resources): State<AppResources>,
    jar: CookieJar,
    RequireAuth(claims): RequireAuth,
) -> Result<impl IntoResponse, AuthError> {
    resources
        .sessions()
        .invalidate(&claims.session)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "session revocation failed");
            AuthError::server_error()
        })?;

    let jar = jar
        .add(cookies::clear_cookie(&resources.config, ACCESS_COOKIE))
        .add(cookies::clear_cookie(&resources.config, REFRESH_COOKIE));

    Ok((
        jar,
        Json(TokenPair {
            access_token: None,
            refresh_token: None,
        }),
    ))
}

/// The resolved identity, as downstream handlers see it.
#[tracing::instrument()]
#[utoipa::path(
    get,
    path = "/api/me",
    tag = SESSIONS_TAG,
    operation_id = "Current Identity",
    summary = "Return the caller's resolved identity",
    security(("Authorization" = [])),
    responses(
        (status = 200, description = "Resolved claims", body = Claims),
        (status = 403, description = "No identity resolved", body = AuthError),
    )
)]
pub async fn me(RequireAuth(claims): RequireAuth) -> Json<Claims> {
    Json(claims)
}
