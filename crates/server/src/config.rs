use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Signing and lifetime policy for issued credentials.
#[derive(Clone, Debug, Deserialize)]
pub struct JwtConfig {
    /// HMAC secret for HS256 signing. Immutable after startup; rotation is
    /// a redeploy, not a runtime mutation.
    pub secret: String,
    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl_secs: i64,
    #[serde(default = "default_refresh_token_ttl")]
    pub refresh_token_ttl_secs: i64,
}

/// One OAuth provider's endpoints and client credentials.
///
/// The token/userinfo URLs are configurable so tests can point them at a
/// local mock server.
#[derive(Clone, Debug, Deserialize)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OAuthConfig {
    pub google: ProviderConfig,
    pub facebook: ProviderConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Browser-facing origin the OAuth callbacks redirect back to.
    pub client_origin: String,
    /// Enables Secure + SameSite=Strict cookies and the cookie domain.
    #[serde(default)]
    pub production: bool,
    #[serde(default)]
    pub cookie_domain: Option<String>,
    pub jwt: JwtConfig,
    pub oauth: OAuthConfig,
    /// Bound on every outbound provider call.
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_access_token_ttl() -> i64 {
    900 // 15 minutes
}

fn default_refresh_token_ttl() -> i64 {
    31_536_000 // 1 year
}

fn default_provider_timeout() -> u64 {
    10
}

/// Load application configuration from `config.yaml` + environment overrides.
///
/// Environment variable override convention: any var matching the key path
/// separated by double underscores (e.g. `JWT__SECRET`) overrides the file
/// value.
///
/// Returns a `ConfigError` instead of panicking so the caller can decide how
/// to fail.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File};
    let cfg = Config::builder()
        .add_source(File::with_name("config.yaml"))
        .add_source(Environment::default().separator("__"))
        .build()?;

    let app: AppConfig = cfg.try_deserialize()?;
    validate(&app)?;
    Ok(app)
}

fn validate(app: &AppConfig) -> Result<(), ConfigError> {
    if app.jwt.secret.len() < 32 {
        return Err(ConfigError::Validation(
            "jwt.secret must be at least 32 bytes".into(),
        ));
    }
    if app.jwt.access_token_ttl_secs <= 0 || app.jwt.refresh_token_ttl_secs <= 0 {
        return Err(ConfigError::Validation(
            "jwt token TTLs must be positive".into(),
        ));
    }
    if app.client_origin.is_empty() {
        return Err(ConfigError::Validation(
            "client_origin must not be empty".into(),
        ));
    }
    Ok(())
}

/// Convenience helper for binaries wanting panic-on-error behaviour.
pub fn load_config_or_panic() -> AppConfig {
    match load_config() {
        Ok(c) => c,
        Err(e) => panic!("Failed to load configuration: {e}"),
    }
}
