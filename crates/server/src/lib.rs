//! Session and credential service.
//!
//! Issues short-lived access and long-lived refresh credentials bound to
//! revocable sessions, silently re-issues expired access credentials per
//! request, and federates identity to external OAuth providers.

use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::session::SessionStore;
use crate::token::TokenCodec;
use crate::users::UserService;

pub mod api;
pub mod auth;
pub mod config;
pub mod cookies;
pub mod entity;
pub mod error;
pub mod oauth;
pub mod password;
pub mod session;
pub mod token;
pub mod users;

/// Shared process-wide resources handed to every handler.
#[derive(Clone)]
pub struct AppResources {
    pub db: Arc<DatabaseConnection>,
    /// Outbound client for provider calls, with a bounded timeout.
    pub http: reqwest::Client,
    pub config: Arc<AppConfig>,
    pub codec: TokenCodec,
}

impl AppResources {
    pub fn new(db: Arc<DatabaseConnection>, config: Arc<AppConfig>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.provider_timeout_secs))
            .build()
            .expect("Failed to build HTTP client");
        let codec = TokenCodec::new(config.jwt.secret.as_bytes());
        Self {
            db,
            http,
            config,
            codec,
        }
    }

    pub fn sessions(&self) -> SessionStore {
        SessionStore::new(self.db.clone())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.db.clone())
    }
}
