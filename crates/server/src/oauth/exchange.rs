//! The federation exchange pipeline.
//!
//! Sequential, suspending only at the two provider calls and the store
//! operations. No session or user is touched until the provider profile has
//! been fetched and its email verified.

use std::time::Duration;

use crate::AppResources;
use crate::entity::{session, user};
use crate::error::ExchangeError;
use crate::oauth::provider::{ProviderKind, ProviderProfile, ProviderTokens};
use crate::token::Claims;

/// Everything a callback handler needs to finish the login: the upserted
/// user, the new session, and both signed credentials.
pub struct ExchangeOutcome {
    pub user: user::Model,
    pub session: session::Model,
    pub access_token: String,
    pub refresh_token: String,
}

/// Run the full authorization-code exchange for one provider.
#[tracing::instrument(skip(resources, code), fields(provider = kind.name()))]
pub async fn run_exchange(
    resources: &AppResources,
    kind: ProviderKind,
    code: &str,
    user_agent: &str,
) -> Result<ExchangeOutcome, ExchangeError> {
    let tokens = fetch_tokens(resources, kind, code).await?;
    let body = fetch_profile(resources, kind, &tokens).await?;
    let profile = kind.parse_profile(&body)?;

    tracing::info!(email = %profile.email, "provider profile verified");

    let user = upsert_user(resources, &profile).await?;
    let session = resources
        .sessions()
        .create(&user.id, user_agent)
        .await
        .map_err(ExchangeError::Storage)?;

    let access_token = resources.codec.issue(&Claims::for_session(
        &user,
        &session.id,
        resources.config.jwt.access_token_ttl_secs,
    ))?;
    let refresh_token = resources.codec.issue(&Claims::for_session(
        &user,
        &session.id,
        resources.config.jwt.refresh_token_ttl_secs,
    ))?;

    Ok(ExchangeOutcome {
        user,
        session,
        access_token,
        refresh_token,
    })
}

fn timeout(resources: &AppResources) -> Duration {
    Duration::from_secs(resources.config.provider_timeout_secs)
}

/// Step 1: code -> provider tokens.
async fn fetch_tokens(
    resources: &AppResources,
    kind: ProviderKind,
    code: &str,
) -> Result<ProviderTokens, ExchangeError> {
    let provider = kind.config(&resources.config);
    let response = resources
        .http
        .post(&provider.token_url)
        .form(&[
            ("code", code),
            ("client_id", provider.client_id.as_str()),
            ("client_secret", provider.client_secret.as_str()),
            ("redirect_uri", provider.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await
        .map_err(|e| ExchangeError::from_reqwest(e, timeout(resources)))?;

    let status = response.status();
    if !status.is_success() {
        let context = response.text().await.unwrap_or_default();
        return Err(ExchangeError::Http { status, context });
    }

    response
        .json::<ProviderTokens>()
        .await
        .map_err(|e| ExchangeError::Json(e.to_string()))
}

/// Step 2: provider tokens -> raw userinfo body.
async fn fetch_profile(
    resources: &AppResources,
    kind: ProviderKind,
    tokens: &ProviderTokens,
) -> Result<String, ExchangeError> {
    let provider = kind.config(&resources.config);
    let request = match kind {
        ProviderKind::Google => resources
            .http
            .get(&provider.userinfo_url)
            .query(&[
                ("alt", "json"),
                ("access_token", tokens.access_token.as_str()),
            ])
            .bearer_auth(tokens.id_token.as_deref().unwrap_or(&tokens.access_token)),
        ProviderKind::Facebook => resources.http.get(&provider.userinfo_url).query(&[
            ("fields", "id,name,email"),
            ("access_token", tokens.access_token.as_str()),
        ]),
    };

    let response = request
        .send()
        .await
        .map_err(|e| ExchangeError::from_reqwest(e, timeout(resources)))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ExchangeError::from_reqwest(e, timeout(resources)))?;
    if !status.is_success() {
        return Err(ExchangeError::Http {
            status,
            context: body,
        });
    }
    Ok(body)
}

async fn upsert_user(
    resources: &AppResources,
    profile: &ProviderProfile,
) -> Result<user::Model, ExchangeError> {
    resources
        .users()
        .upsert_federated(
            &profile.email,
            profile.name.as_deref(),
            profile.picture.as_deref(),
        )
        .await
        .map_err(ExchangeError::Storage)
}
