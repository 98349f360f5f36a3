//! Provider parameterization: endpoints, token responses and profile
//! normalization for each supported identity provider.

use serde::Deserialize;

use crate::config::{AppConfig, ProviderConfig};
use crate::error::ExchangeError;

/// Supported identity providers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    Google,
    Facebook,
}

impl ProviderKind {
    pub fn name(self) -> &'static str {
        match self {
            ProviderKind::Google => "google",
            ProviderKind::Facebook => "facebook",
        }
    }

    pub fn config(self, config: &AppConfig) -> &ProviderConfig {
        match self {
            ProviderKind::Google => &config.oauth.google,
            ProviderKind::Facebook => &config.oauth.facebook,
        }
    }
}

/// Token endpoint response. Google additionally returns an `id_token`;
/// Facebook does not.
#[derive(Debug, Deserialize)]
pub struct ProviderTokens {
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Provider profile normalized to the fields the upsert needs.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderProfile {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleProfile {
    email: Option<String>,
    #[serde(default)]
    verified_email: bool,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FacebookProfile {
    email: Option<String>,
    name: Option<String>,
}

impl ProviderKind {
    /// Normalize a raw userinfo body, enforcing the verified-email
    /// requirement with provider-specific rejection text.
    pub fn parse_profile(self, body: &str) -> Result<ProviderProfile, ExchangeError> {
        match self {
            ProviderKind::Google => {
                let profile: GoogleProfile =
                    serde_json::from_str(body).map_err(|e| ExchangeError::Json(e.to_string()))?;
                let email = profile.email.filter(|_| profile.verified_email).ok_or(
                    ExchangeError::UnverifiedEmail("Google account email not verified"),
                )?;
                Ok(ProviderProfile {
                    email,
                    name: profile.name,
                    picture: profile.picture,
                })
            }
            ProviderKind::Facebook => {
                let profile: FacebookProfile =
                    serde_json::from_str(body).map_err(|e| ExchangeError::Json(e.to_string()))?;
                // The Graph API only returns an email once Facebook has
                // confirmed it, so presence doubles as verification.
                let email = profile.email.ok_or(ExchangeError::UnverifiedEmail(
                    "Facebook account has no verified email",
                ))?;
                Ok(ProviderProfile {
                    email,
                    name: profile.name,
                    picture: None,
                })
            }
        }
    }
}
