//! Credential resolver middleware.
//!
//! Runs on every request, strictly before the inner handler. Terminal
//! states per request:
//!
//! - no access credential, or any verification failure → anonymous, the
//!   request proceeds without an identity;
//! - access credential valid → identity attached;
//! - access credential expired + refresh credential valid + session still
//!   valid → identity attached from the refresh snapshot and a fresh access
//!   credential emitted on the response (`x-access-token` header + cookie).
//!
//! The resolver never returns an error response; every internal failure
//! degrades to anonymous and authorization is left to route-level
//! extractors. Refresh mutates nothing, so racing requests holding the same
//! refresh credential each mint their own access credential.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, header::SET_COOKIE},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::AppResources;
use crate::auth::{NEW_ACCESS_HEADER, REFRESH_HEADER};
use crate::cookies::{self, ACCESS_COOKIE, REFRESH_COOKIE};
use crate::token::{Claims, Verification};

/// Identity resolved for the current request, attached as an extension.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub Claims);

enum Resolution {
    Anonymous,
    Authenticated(Claims),
    Refreshed { claims: Claims, token: String },
}

/// Axum middleware wiring: extract candidates, resolve, attach identity,
/// and emit the re-issued credential after the inner handler has run.
pub async fn resolve_credentials(
    State(resources): State<AppResources>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let access = jar
        .get(ACCESS_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| bearer_token(&request));
    let refresh = request
        .headers()
        .get(REFRESH_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .or_else(|| jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()));

    match resolve(&resources, access.as_deref(), refresh.as_deref()).await {
        Resolution::Anonymous => next.run(request).await,
        Resolution::Authenticated(claims) => {
            request.extensions_mut().insert(CurrentUser(claims));
            next.run(request).await
        }
        Resolution::Refreshed { claims, token } => {
            tracing::debug!(user_id = %claims.sub, session_id = %claims.session, "access credential re-issued");
            request.extensions_mut().insert(CurrentUser(claims));
            let mut response = next.run(request).await;
            emit_new_access(&resources, &mut response, &token);
            response
        }
    }
}

fn bearer_token(request: &Request) -> Option<String> {
    let header = request.headers().get(axum::http::header::AUTHORIZATION)?;
    let value = header.to_str().ok()?;
    value.strip_prefix("Bearer ").map(String::from)
}

/// The decision procedure itself, separated from the axum plumbing.
async fn resolve(
    resources: &AppResources,
    access: Option<&str>,
    refresh: Option<&str>,
) -> Resolution {
    let Some(access) = access else {
        return Resolution::Anonymous;
    };

    match resources.codec.verify(access) {
        Verification {
            valid: true,
            claims: Some(claims),
            ..
        } => return Resolution::Authenticated(claims),
        Verification { expired: true, .. } => {}
        // Tampered or malformed: reject outright, never attempt refresh.
        _ => return Resolution::Anonymous,
    }

    let Some(refresh) = refresh else {
        return Resolution::Anonymous;
    };

    let claims = match resources.codec.verify(refresh) {
        Verification {
            valid: true,
            claims: Some(claims),
            ..
        } => claims,
        _ => return Resolution::Anonymous,
    };

    // Revocation is enforced here: a refresh credential is only honoured
    // while its session row is still valid.
    match resources.sessions().find_by_id(&claims.session).await {
        Ok(Some(session)) if session.valid => {}
        Ok(_) => {
            tracing::debug!(session_id = %claims.session, "refresh denied: session revoked or unknown");
            return Resolution::Anonymous;
        }
        Err(e) => {
            tracing::warn!(error = %e, "refresh denied: session lookup failed");
            return Resolution::Anonymous;
        }
    }

    let fresh = claims.reissue(resources.config.jwt.access_token_ttl_secs);
    match resources.codec.issue(&fresh) {
        Ok(token) => Resolution::Refreshed {
            claims: fresh,
            token,
        },
        Err(e) => {
            tracing::error!(error = %e, "failed to re-issue access credential");
            Resolution::Anonymous
        }
    }
}

fn emit_new_access(resources: &AppResources, response: &mut Response, token: &str) {
    if let Ok(value) = HeaderValue::from_str(token) {
        response.headers_mut().insert(NEW_ACCESS_HEADER, value);
    }
    let cookie = cookies::access_cookie(&resources.config, token);
    if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
        response.headers_mut().append(SET_COOKIE, value);
    }
}
