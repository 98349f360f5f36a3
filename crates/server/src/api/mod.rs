//! API module providing the HTTP surface.
//!
//! - `users` - registration (/api/users)
//! - `sessions` - login, listing and revocation (/api/sessions, /api/me)
//! - `oauth` - provider callbacks (/api/oauth/*)
//! - `health` - health check endpoint (/healthz)
//! - `openapi` - OpenAPI/Utoipa configuration

pub mod health;
pub mod oauth;
pub mod openapi;
pub mod sessions;
pub mod users;

pub use health::MISC_TAG;

/// Tag for OpenAPI documentation.
pub const USERS_TAG: &str = "Users";
/// Tag for OpenAPI documentation.
pub const SESSIONS_TAG: &str = "Sessions";
/// Tag for OpenAPI documentation.
pub const OAUTH_TAG: &str = "OAuth";

use crate::AppResources;
use crate::auth::resolve_credentials;
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa_redoc::{Redoc, Servable};

/// Build the full application router.
///
/// The credential resolver wraps every route, so even anonymous-friendly
/// endpoints see a resolved identity when one is presented.
pub fn build_router(resources: AppResources) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(openapi::ApiDoc::openapi())
        .nest("/api/users", users::router())
        .nest("/api/sessions", sessions::router())
        .nest("/api/oauth", oauth::router())
        .routes(routes!(sessions::me))
        .routes(routes!(health::health))
        .layer(axum::middleware::from_fn_with_state(
            resources.clone(),
            resolve_credentials,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(resources)
        .split_for_parts();

    router.merge(Redoc::with_url("/api-docs", api))
}

/// Starts the web server with all configured routes.
#[tracing::instrument(skip(resources))]
pub async fn start_webserver(resources: AppResources) -> color_eyre::Result<()> {
    let bind_addr = resources.config.bind_addr.clone();
    let router = build_router(resources);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "server listening");
    axum::serve(listener, router)
        .await
        .map_err(|e| color_eyre::Report::msg(format!("Failed to start server: {e}")))?;

    Ok(())
}
