//! OpenAPI/Utoipa configuration.

use crate::api::{OAUTH_TAG, SESSIONS_TAG, USERS_TAG, health::MISC_TAG};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

/// Security addon for OpenAPI documentation.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            let bearer = HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("JWT")
                .description(Some(
                    "Access credential issued by `POST /api/sessions`. Usually carried by the \
                     `accessToken` cookie; the Bearer header is the fallback.",
                ))
                .build();
            components.add_security_scheme("Authorization", SecurityScheme::Http(bearer));
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "session-gate",
        description = "Session and credential service: password and federated login, \
                       revocable sessions, and transparent access-credential refresh.",
        license(name = "AGPL-3.0-or-later"),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = USERS_TAG, description = "Account registration"),
        (name = SESSIONS_TAG, description = "Session issuance, listing and revocation"),
        (name = OAUTH_TAG, description = "OAuth provider callbacks"),
        (name = MISC_TAG, description = "Service endpoints"),
    )
)]
pub struct ApiDoc;
