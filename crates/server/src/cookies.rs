//! Credential cookie construction.
//!
//! Both credentials ride in HttpOnly cookies. `Secure` + `SameSite=Strict`
//! and the configured domain apply only in production deployments; local
//! development gets `Lax` host-only cookies.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::config::AppConfig;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

fn base(config: &AppConfig, name: &'static str, value: String, max_age: Duration) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_max_age(max_age);
    if config.production {
        cookie.set_secure(true);
        cookie.set_same_site(SameSite::Strict);
        if let Some(domain) = &config.cookie_domain {
            cookie.set_domain(domain.clone());
        }
    } else {
        cookie.set_same_site(SameSite::Lax);
    }
    cookie
}

pub fn access_cookie(config: &AppConfig, token: &str) -> Cookie<'static> {
    base(
        config,
        ACCESS_COOKIE,
        token.to_string(),
        Duration::seconds(config.jwt.access_token_ttl_secs),
    )
}

pub fn refresh_cookie(config: &AppConfig, token: &str) -> Cookie<'static> {
    base(
        config,
        REFRESH_COOKIE,
        token.to_string(),
        Duration::seconds(config.jwt.refresh_token_ttl_secs),
    )
}

/// Expired empty-value cookie used to clear a credential on logout.
pub fn clear_cookie(config: &AppConfig, name: &'static str) -> Cookie<'static> {
    base(config, name, String::new(), Duration::ZERO)
}
