//! OAuth callback endpoints, one per provider.
//!
//! Callbacks always terminate in a redirect or a plain rejection, never a
//! JSON body. Provider failures redirect to the client's error page with
//! the detail kept in the server log.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use utoipa::IntoParams;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::AppResources;
use crate::api::OAUTH_TAG;
use crate::auth::AuthError;
use crate::cookies;
use crate::error::ExchangeError;
use crate::oauth::{ProviderKind, run_exchange};

#[derive(Debug, Deserialize, IntoParams)]
pub struct CallbackParams {
    /// Authorization code from the provider redirect.
    pub code: Option<String>,
    /// Provider-reported error (user denied consent, etc.).
    pub error: Option<String>,
}

/// Creates the OAuth callback router.
pub fn router() -> OpenApiRouter<AppResources> {
    OpenApiRouter::new()
        .routes(routes!(google_callback))
        .routes(routes!(facebook_callback))
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/google/callback",
    tag = OAUTH_TAG,
    operation_id = "Google OAuth Callback",
    summary = "Complete a Google login",
    params(CallbackParams),
    responses(
        (status = 303, description = "Redirect to the client origin on success, or to its error page on provider failure"),
        (status = 403, description = "Unverified email or identity could not be stored", body = AuthError),
    )
)]
async fn google_callback(
    State(resources): State<AppResources>,
    jar: CookieJar,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    handle_callback(resources, ProviderKind::Google, jar, headers, params).await
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/facebook/callback",
    tag = OAUTH_TAG,
    operation_id = "Facebook OAuth Callback",
    summary = "Complete a Facebook login",
    params(CallbackParams),
    responses(
        (status = 303, description = "Redirect to the client origin on success, or to its error page on provider failure"),
        (status = 403, description = "Unverified email or identity could not be stored", body = AuthError),
    )
)]
async fn facebook_callback(
    State(resources): State<AppResources>,
    jar: CookieJar,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    handle_callback(resources, ProviderKind::Facebook, jar, headers, params).await
}

fn error_redirect(resources: &AppResources) -> Response {
    Redirect::to(&format!("{}/oauth/error", resources.config.client_origin)).into_response()
}

/// Single failure boundary for the whole exchange pipeline.
async fn handle_callback(
    resources: AppResources,
    kind: ProviderKind,
    jar: CookieJar,
    headers: HeaderMap,
    params: CallbackParams,
) -> Response {
    if let Some(error) = params.error.as_deref() {
        tracing::warn!(provider = kind.name(), error, "provider reported an error");
        return error_redirect(&resources);
    }
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        tracing::warn!(provider = kind.name(), "callback missing authorization code");
        return error_redirect(&resources);
    };

    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    match run_exchange(&resources, kind, &code, user_agent).await {
        Ok(outcome) => {
            tracing::info!(
                provider = kind.name(),
                user_id = %outcome.user.id,
                session_id = %outcome.session.id,
                "federated login succeeded"
            );
            let jar = jar
                .add(cookies::access_cookie(
                    &resources.config,
                    &outcome.access_token,
                ))
                .add(cookies::refresh_cookie(
                    &resources.config,
                    &outcome.refresh_token,
                ));
            (jar, Redirect::to(&resources.config.client_origin)).into_response()
        }
        // Explicit rejection, distinct from provider failure.
        Err(ExchangeError::UnverifiedEmail(reason)) => {
            tracing::warn!(provider = kind.name(), reason, "federated login rejected");
            AuthError::forbidden(reason).into_response()
        }
        Err(e) if e.is_provider_failure() => {
            tracing::error!(provider = kind.name(), error = %e, "federation exchange failed");
            error_redirect(&resources)
        }
        // Storage or issuance failure on our side of the boundary.
        Err(e) => {
            tracing::error!(provider = kind.name(), error = %e, "identity could not be established");
            AuthError::forbidden("Unable to establish local identity").into_response()
        }
    }
}
